//! Pipeline orchestration: scan, fetch, reassemble, validate.
//!
//! Data flows strictly forward through the four stages; no stage reads back
//! from a downstream one.

use crate::config::Config;
use crate::fetch::FragmentFetcher;
use crate::mux::Reassembler;
use crate::validate::{self, Verdict};
use crate::{capture, Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory for raw per-fragment files, under the output directory.
pub const FRAGMENT_DIR: &str = "fragments";

/// Characters never allowed in an explicit output identifier. The identifier
/// names directories and files handed to the muxing process.
const FORBIDDEN_IDENTIFIER_CHARS: &str = ".,=+()/?'|*&^%$#@!`";

/// Overwrite confirmation port. The CLI wires a stdin prompt; tests and
/// non-interactive callers supply a closure.
pub type ConfirmOverwrite = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// How a pipeline run ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The final artifact was written.
    Completed { output: PathBuf, verdict: Verdict },
    /// The operator declined to overwrite an existing output. No side
    /// effects beyond the existence check itself.
    Declined,
}

/// Reconstructs one video file from a capture.
pub struct Pipeline {
    config: Config,
    confirm: ConfirmOverwrite,
}

impl Pipeline {
    /// Create a pipeline that overwrites existing outputs without asking.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            confirm: Box::new(|_| true),
        }
    }

    /// Install an overwrite confirmation callback.
    pub fn with_confirm(mut self, confirm: ConfirmOverwrite) -> Self {
        self.confirm = confirm;
        self
    }

    /// Run the full capture → fetch → reassemble → validate pipeline.
    ///
    /// `identifier` names the output directory and file; when absent it is
    /// derived from the capture file name. Explicit identifiers are checked
    /// against the forbidden character set before any work begins.
    pub async fn run(&self, har_path: &Path, identifier: Option<&str>) -> Result<Outcome> {
        if !har_path.exists() {
            return Err(Error::input(format!(
                "capture file not found: {}",
                har_path.display()
            )));
        }

        let identifier = match identifier {
            Some(id) => {
                validate_identifier(id)?;
                id.to_string()
            }
            None => identifier_from_capture(har_path)?,
        };

        let out_dir = PathBuf::from(&identifier);
        let final_output = out_dir.join(format!("{identifier}.mp4"));
        if final_output.exists() && !(self.confirm)(&final_output) {
            info!("declined overwrite of {}", final_output.display());
            return Ok(Outcome::Declined);
        }

        let capture_text = std::fs::read_to_string(har_path)?;
        let locators = capture::scan(&capture_text)?;
        info!("{} fragment locators extracted", locators.len());

        if locators.is_empty() {
            return Err(Error::input("capture yielded no fragment locators"));
        }

        let fetcher = FragmentFetcher::new(&self.config, out_dir.join(FRAGMENT_DIR), &identifier);
        let set = fetcher.fetch_all(&locators).await?;
        info!(
            video = set.video.len(),
            audio = set.audio.len(),
            "fragments ready"
        );

        let reassembler = Reassembler::new(&self.config)?;
        let output = reassembler.reassemble(&out_dir, &identifier, &set).await?;

        let verdict = validate::validate_and_clean(&out_dir, &output, self.config.min_output_bytes)?;
        Ok(Outcome::Completed { output, verdict })
    }
}

/// Reject identifiers carrying shell-unsafe characters. Hard boundary
/// requirement for anything interpolated into paths and tool invocations.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(Error::input("output identifier is empty"));
    }
    if let Some(c) = identifier
        .chars()
        .find(|c| FORBIDDEN_IDENTIFIER_CHARS.contains(*c))
    {
        return Err(Error::input(format!(
            "output identifier contains forbidden character {c:?}"
        )));
    }
    Ok(())
}

/// Default identifier: the capture file's name without its `.har` suffix.
pub fn identifier_from_capture(har_path: &Path) -> Result<String> {
    let name = har_path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::input(format!("unusable capture path: {}", har_path.display())))?;
    Ok(name.strip_suffix(".har").unwrap_or(name).to_string())
}
