//! harvid - reassemble a playable video from a browser HAR capture.
//!
//! A capture trace records each media fragment as a separate HTTP transfer.
//! This crate extracts the fragment URLs from the trace, fetches them to
//! deterministic local paths (resuming across runs), and stream-copies them
//! back into one playable file via ffmpeg.

pub mod capture;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fragment;
pub mod mux;
pub mod pipeline;
pub mod tools;
pub mod validate;

pub use error::{Error, Result};
