//! Fragment naming and the ordered fragment set.

use std::path::{Path, PathBuf};

/// Width of the zero-padded sequence field in fragment file names.
const SEQUENCE_WIDTH: usize = 5;

/// Media stream a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Video,
    Audio,
}

/// One chunked piece of the captured stream, derived from its locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Remote URL the fragment is fetched from.
    pub locator: String,
    /// Zero-padded sequence field, always five digits.
    pub sequence: String,
    /// Trailing file-type token of the locator (`ts` or `aac`).
    pub extension: String,
    /// Deterministic on-disk location for the fetched bytes.
    pub local_path: PathBuf,
}

impl Fragment {
    /// Derive a fragment from its locator.
    ///
    /// The sequence field is the last run of ASCII digits in the locator,
    /// zero-padded to five digits and capped to the last five, so sequence
    /// numbers at or above 100000 alias modulo 100000. The local path is a
    /// pure function of (identifier, sequence, extension): the same locator
    /// always maps to the same path, which is what makes resume work.
    ///
    /// Returns `None` when the locator carries no digits at all.
    pub fn derive(locator: &str, fragment_dir: &Path, identifier: &str) -> Option<Self> {
        let digits = last_digit_run(locator)?;
        let padded = format!("{:0>width$}", digits, width = SEQUENCE_WIDTH);
        let sequence = padded[padded.len() - SEQUENCE_WIDTH..].to_string();
        let extension = locator.rsplit('.').next()?.to_string();
        let local_path = fragment_dir.join(format!("{identifier}_{sequence}.{extension}"));
        Some(Self {
            locator: locator.to_string(),
            sequence,
            extension,
            local_path,
        })
    }

    /// Audio iff the extension is the audio type, video otherwise.
    pub fn kind(&self) -> FragmentKind {
        if self.extension == "aac" {
            FragmentKind::Audio
        } else {
            FragmentKind::Video
        }
    }

    /// Sequence field as a number, for notice heuristics.
    pub fn sequence_number(&self) -> u32 {
        self.sequence.parse().unwrap_or(0)
    }
}

/// Last maximal run of ASCII digits in `s`.
fn last_digit_run(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let end = bytes.iter().rposition(|b| b.is_ascii_digit())? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);
    Some(&s[start..end])
}

/// Ordered audio and video fragment sequences, populated in capture order.
///
/// Order is never re-sorted by sequence number: final playback order depends
/// on the capture's entries already being chronological.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FragmentSet {
    pub video: Vec<Fragment>,
    pub audio: Vec<Fragment>,
}

impl FragmentSet {
    /// Whether either sequence has already claimed `path` this run.
    pub fn contains_path(&self, path: &Path) -> bool {
        self.find_by_path(path).is_some()
    }

    /// Fragment currently holding `path`, if either sequence claims it.
    pub fn find_by_path(&self, path: &Path) -> Option<&Fragment> {
        self.video
            .iter()
            .chain(self.audio.iter())
            .find(|f| f.local_path == path)
    }

    /// Replace the entry holding the fragment's path, keeping its slot.
    ///
    /// The path encodes the extension, so the replacement always lands in
    /// the same sequence as the entry it displaces.
    pub fn replace(&mut self, fragment: Fragment) {
        let sequence = match fragment.kind() {
            FragmentKind::Audio => &mut self.audio,
            FragmentKind::Video => &mut self.video,
        };
        if let Some(slot) = sequence
            .iter_mut()
            .find(|f| f.local_path == fragment.local_path)
        {
            *slot = fragment;
        }
    }

    /// Append to the sequence matching the fragment's kind.
    pub fn push(&mut self, fragment: Fragment) {
        match fragment.kind() {
            FragmentKind::Audio => self.audio.push(fragment),
            FragmentKind::Video => self.video.push(fragment),
        }
    }

    /// Reassembly strategy: integrated unless audio arrived as its own track.
    pub fn strategy(&self) -> Strategy {
        if self.audio.is_empty() {
            Strategy::Integrated
        } else {
            Strategy::SeparateTracks
        }
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }
}

/// How the fragment set turns into one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Video fragments already carry their audio; concat them directly.
    Integrated,
    /// Audio arrived separately; mux each video/audio pair, then concat.
    SeparateTracks,
}
