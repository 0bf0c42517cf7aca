//! Fragment fetching: resolve locators to local files with resume semantics.
//!
//! Duplicate and stale-path resolution happens in a sequential planning pass
//! over the locators, so the fragment set is fully determined before any
//! network traffic. Missing files are then fetched by a bounded pool of
//! concurrent workers, each writing to its deterministically derived path;
//! resume semantics are therefore unaffected by concurrency.

use crate::config::Config;
use crate::fragment::{Fragment, FragmentSet};
use crate::{Error, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(f32, &str) + Send + Sync>;

/// Resolves each locator to a local fragment file.
pub struct FragmentFetcher {
    client: Client,
    fragment_dir: PathBuf,
    identifier: String,
    concurrency: usize,
    duplicate_notice_min_sequence: u32,
    duplicate_notice_small_input: usize,
    progress_callback: Option<ProgressCallback>,
}

impl FragmentFetcher {
    pub fn new(config: &Config, fragment_dir: PathBuf, identifier: &str) -> Self {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            fragment_dir,
            identifier: identifier.to_string(),
            concurrency: config.fetch_concurrency.max(1),
            duplicate_notice_min_sequence: config.duplicate_notice_min_sequence,
            duplicate_notice_small_input: config.duplicate_notice_small_input,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report_progress(&self, progress: f32, step: &str) {
        if let Some(ref cb) = self.progress_callback {
            cb(progress, step);
        }
        info!("[{:.0}%] {}", progress, step);
    }

    /// Consume the locator sequence and produce the fragment set.
    ///
    /// Files already on disk are not fetched again, which gives resumability
    /// across runs. A distinct locator claiming an already-claimed path evicts
    /// the on-disk file (the arriving fragment is canonical) and refetches.
    /// Transfer errors are fatal; fragments already written stay for resume.
    pub async fn fetch_all(&self, locators: &[String]) -> Result<FragmentSet> {
        std::fs::create_dir_all(&self.fragment_dir)?;

        let mut set = FragmentSet::default();
        let mut pending: Vec<Fragment> = Vec::new();

        for locator in locators {
            let fragment = Fragment::derive(locator, &self.fragment_dir, &self.identifier)
                .ok_or_else(|| Error::input(format!("no sequence digits in locator {locator}")))?;

            let on_disk = fragment.local_path.exists();
            if let Some(claimed) = set.find_by_path(&fragment.local_path) {
                if claimed.locator == fragment.locator {
                    // True duplicate: the capture names the same URL twice.
                    // Whatever the path holds (or will hold) is already right.
                    if fragment.sequence_number() > self.duplicate_notice_min_sequence
                        || locators.len() < self.duplicate_notice_small_input
                    {
                        info!("duplicate fragment path {}", fragment.local_path.display());
                    }
                    continue;
                }

                // A different locator claims this derived path: the arriving
                // fragment is canonical. The path keeps its original position
                // in the sequence, but the content it will hold comes from
                // the new locator.
                if on_disk {
                    warn!("evicting stale fragment {}", fragment.local_path.display());
                    std::fs::remove_file(&fragment.local_path)?;
                }
                if let Some(queued) = pending
                    .iter_mut()
                    .find(|f| f.local_path == fragment.local_path)
                {
                    *queued = fragment.clone();
                } else {
                    pending.push(fragment.clone());
                }
                set.replace(fragment);
                continue;
            }

            if !on_disk {
                pending.push(fragment.clone());
            } else {
                debug!("resuming with existing {}", fragment.local_path.display());
            }
            set.push(fragment);
        }

        if pending.is_empty() {
            info!("all {} fragments already on disk", set.video.len() + set.audio.len());
            return Ok(set);
        }

        info!(
            "fetching {} of {} fragments",
            pending.len(),
            set.video.len() + set.audio.len()
        );

        let total = pending.len();
        let completed = AtomicUsize::new(0);

        stream::iter(pending.iter())
            .map(|fragment| {
                let completed = &completed;
                async move {
                    self.fetch_one(fragment).await?;
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    self.report_progress(
                        done as f32 / total as f32 * 100.0,
                        &format!("fetched {}", fragment.sequence),
                    );
                    Ok::<(), Error>(())
                }
            })
            .buffer_unordered(self.concurrency)
            .try_collect::<()>()
            .await?;

        Ok(set)
    }

    /// Fetch one fragment and write it verbatim to its local path.
    async fn fetch_one(&self, fragment: &Fragment) -> Result<()> {
        debug!("GET {}", fragment.locator);

        let transfer_err = |source| Error::Transfer {
            locator: fragment.locator.clone(),
            source,
        };

        let response = self
            .client
            .get(&fragment.locator)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transfer_err)?;
        let bytes = response.bytes().await.map_err(transfer_err)?;

        // Resume treats any file at the derived path as complete, so land the
        // bytes under a scratch name and rename into place.
        let scratch = fragment
            .local_path
            .with_extension(format!("{}.part", fragment.extension));
        tokio::fs::write(&scratch, &bytes).await?;
        tokio::fs::rename(&scratch, &fragment.local_path).await?;

        Ok(())
    }
}
