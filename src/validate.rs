//! Final artifact validation and cleanup gating.

use crate::pipeline::FRAGMENT_DIR;
use crate::{mux, Result};
use std::path::Path;
use tracing::{info, warn};

/// Verdict of the size sanity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Output looks plausible; intermediate state was removed.
    Valid,
    /// Output is implausibly small; everything was left for inspection.
    Suspect,
}

/// Sanity-check the final artifact and gate cleanup of intermediate state.
///
/// A suspect output (smaller than `min_bytes`) leaves the manifest, the
/// fragments directory and the temp directory in place for manual
/// inspection. Otherwise all three are removed, completing the run. One-shot
/// gate: there is no quarantine state beyond "leave everything as-is".
pub fn validate_and_clean(out_dir: &Path, output: &Path, min_bytes: u64) -> Result<Verdict> {
    let size = std::fs::metadata(output)?.len();

    if size < min_bytes {
        warn!(
            "output {} is only {} bytes (< {}); leaving intermediate files for inspection",
            output.display(),
            size,
            min_bytes
        );
        return Ok(Verdict::Suspect);
    }

    let manifest = out_dir.join(mux::MANIFEST_NAME);
    if manifest.exists() {
        std::fs::remove_file(&manifest)?;
    }
    for dir in [out_dir.join(FRAGMENT_DIR), out_dir.join(mux::TEMP_DIR)] {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
    }

    info!("output {} ({} bytes)", output.display(), size);
    Ok(Verdict::Valid)
}
