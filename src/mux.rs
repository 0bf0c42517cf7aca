//! Reassembly: merge fetched fragments into one output via ffmpeg stream copy.
//!
//! Two shapes of invocation, both lossless:
//! - concat-demuxer mode over a manifest of same-format fragments, and
//! - two-input mux mode pairing one video and one audio stream, with a
//!   fast-start layout hint.
//!
//! Arguments are always passed as a vector, never interpolated into a shell
//! string. Exit status is checked on every invocation, and each invocation
//! runs under a bounded timeout.

use crate::config::Config;
use crate::fragment::{FragmentSet, Strategy};
use crate::{tools, Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Name of the concat manifest, written next to the final output.
pub const MANIFEST_NAME: &str = "files.txt";

/// Directory for per-pair intermediate containers in separate-track mode.
pub const TEMP_DIR: &str = "temp";

/// Merges a fragment set into a single output file.
pub struct Reassembler {
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl Reassembler {
    /// Create a reassembler, resolving the ffmpeg binary up front.
    pub fn new(config: &Config) -> Result<Self> {
        let ffmpeg = tools::get_tool_path("ffmpeg", config.ffmpeg_path.as_deref())?;
        Ok(Self {
            ffmpeg,
            timeout: config.mux_timeout(),
        })
    }

    /// Create a reassembler around an explicit tool path.
    pub fn with_tool(ffmpeg: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout,
        }
    }

    /// Merge the fragment set into `<out_dir>/<identifier>.mp4`.
    pub async fn reassemble(
        &self,
        out_dir: &Path,
        identifier: &str,
        set: &FragmentSet,
    ) -> Result<PathBuf> {
        let output = out_dir.join(format!("{identifier}.mp4"));
        match set.strategy() {
            Strategy::Integrated => {
                info!("integrated reassembly of {} fragments", set.video.len());
                let parts: Vec<PathBuf> =
                    set.video.iter().map(|f| f.local_path.clone()).collect();
                self.concat(out_dir, &parts, &output).await?;
            }
            Strategy::SeparateTracks => {
                self.mux_pairs_then_concat(out_dir, identifier, set, &output)
                    .await?;
            }
        }
        Ok(output)
    }

    /// Concat-demuxer mode: manifest of relative names, stream copy.
    async fn concat(&self, out_dir: &Path, parts: &[PathBuf], output: &Path) -> Result<()> {
        let manifest = write_manifest(out_dir, parts)?;

        let mut cmd = self.command();
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&manifest)
            .args(["-c", "copy", "-y"])
            .arg(output);
        self.run(cmd).await
    }

    /// Separate-track mode: pair up video and audio fragments, stream copy
    /// each pair into a fast-start mp4, then concat the pairs in index order.
    async fn mux_pairs_then_concat(
        &self,
        out_dir: &Path,
        identifier: &str,
        set: &FragmentSet,
        output: &Path,
    ) -> Result<()> {
        // Checked before any muxing begins.
        if set.video.len() != set.audio.len() {
            return Err(Error::Precondition {
                video: set.video.len(),
                audio: set.audio.len(),
            });
        }

        let temp_dir = out_dir.join(TEMP_DIR);
        std::fs::create_dir_all(&temp_dir)?;

        let total = set.video.len();
        info!("muxing {} video/audio fragment pairs", total);

        let mut parts = Vec::with_capacity(total);
        for (index, (video, audio)) in set.video.iter().zip(&set.audio).enumerate() {
            let part = temp_dir.join(format!("{identifier}_{}.mp4", audio.sequence));

            let mut cmd = self.command();
            cmd.arg("-i")
                .arg(&video.local_path)
                .arg("-i")
                .arg(&audio.local_path)
                .args(["-map", "0:V:0", "-map", "1:a:0", "-c", "copy"])
                .args(["-f", "mp4", "-movflags", "+faststart", "-y"])
                .arg(&part);
            self.run(cmd).await?;

            info!("[{:.0}%] muxed pair {}", (index + 1) as f32 / total as f32 * 100.0, audio.sequence);
            parts.push(part);
        }

        // The temp containers are deleted by the post-validation cleanup
        // gate, not here, so a failed validation leaves them for inspection.
        self.concat(out_dir, &parts, output).await
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd
    }

    async fn run(&self, mut cmd: Command) -> Result<()> {
        debug!("ffmpeg args: {:?}", cmd.as_std().get_args());
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);

        let result = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result,
            Err(_) => {
                return Err(Error::ToolTimeout {
                    tool: "ffmpeg".to_string(),
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        let output = result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffmpeg")
            } else {
                Error::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tool_failed("ffmpeg", stderr.trim().to_string()));
        }

        Ok(())
    }
}

/// Write the concat manifest, one `file '<name>'` line per part, in recorded
/// order. Names are relative to the manifest's directory, which is how the
/// concat demuxer resolves them.
fn write_manifest(out_dir: &Path, parts: &[PathBuf]) -> Result<PathBuf> {
    let manifest = out_dir.join(MANIFEST_NAME);
    let mut listing = String::new();
    for part in parts {
        let name = part.strip_prefix(out_dir).unwrap_or(part);
        listing.push_str(&format!("file '{}'\n", name.display()));
    }
    std::fs::write(&manifest, listing)?;
    Ok(manifest)
}
