//! Error types for harvid.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconstructing a video from a capture.
///
/// Every variant is fatal to the run. Fragment files already written stay on
/// disk so the next run can resume.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad input at the tool boundary: missing capture file or an unsafe
    /// output identifier.
    #[error("invalid input: {0}")]
    Input(String),

    /// A capture line matched the media filter but did not have the expected
    /// shape.
    #[error("extraction failed at line {line}: {message}")]
    Extraction { line: usize, message: String },

    /// Fetching a fragment from its locator failed.
    #[error("transfer failed for {locator}")]
    Transfer {
        locator: String,
        #[source]
        source: reqwest::Error,
    },

    /// Audio and video fragment counts disagree in separate-track mode.
    #[error("fragment count mismatch: {video} video vs {audio} audio")]
    Precondition { video: usize, audio: usize },

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool failed to execute.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// An external tool exceeded its allotted run time.
    #[error("{tool} timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Create an extraction error for a 1-based line number.
    pub fn extraction(line: usize, message: impl Into<String>) -> Self {
        Self::Extraction {
            line,
            message: message.into(),
        }
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
