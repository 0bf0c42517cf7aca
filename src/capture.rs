//! Capture scanning: extract fragment locators from a HAR trace.
//!
//! The capture is deliberately treated as a flat sequence of text lines, not
//! parsed as a structured document. A line is a candidate iff it mentions one
//! of the media markers and is not a name/value metadata record; the locator
//! is the fourth double-quote-delimited token of a candidate line. The scan is
//! a single stateless pass and re-running it is cheap.

use crate::{Error, Result};

/// Substrings that mark a line as potentially naming a media fragment.
///
/// `.mp4` hits only detect candidate lines; container URLs are never emitted
/// as fragment locators.
const MEDIA_MARKERS: [&str; 3] = [".mp4", ".ts", ".aac"];

/// Lines carrying this substring are header/field name-value records that
/// happen to embed a media marker.
const METADATA_MARKER: &str = "value";

fn is_candidate(line: &str) -> bool {
    MEDIA_MARKERS.iter().any(|marker| line.contains(marker)) && !line.contains(METADATA_MARKER)
}

/// Scan capture text for fragment locators, in capture order.
///
/// Returns only locators ending in `.ts` or `.aac`. A candidate line with
/// fewer than four quote-delimited tokens is a fatal extraction error.
pub fn scan(capture: &str) -> Result<Vec<String>> {
    let mut locators = Vec::new();
    let mut scanned = 0usize;
    for (number, line) in capture.lines().enumerate() {
        scanned += 1;
        if !is_candidate(line) {
            continue;
        }
        let locator = line.split('"').nth(3).ok_or_else(|| {
            Error::extraction(number + 1, "expected a quoted URL as the fourth token")
        })?;
        if locator.ends_with(".ts") || locator.ends_with(".aac") {
            locators.push(locator.to_string());
        }
    }
    tracing::debug!("scanned {} lines, {} locators", scanned, locators.len());
    Ok(locators)
}
