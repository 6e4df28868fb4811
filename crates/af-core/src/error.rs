//! Unified error type for the abrforge pipeline.
//!
//! Every stage funnels its failures into [`Error`]. Stage-level variants
//! ([`Error::Transcode`], [`Error::Packaging`]) wrap the underlying cause so
//! callers can see both where the run stopped and why.

use std::path::PathBuf;

/// Unified error type covering all failure modes of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resolution ladder failed validation.
    #[error("Invalid ladder: {0}")]
    InvalidLadder(String),

    /// The input file does not exist.
    #[error("Input not found: {}", path.display())]
    InputNotFound {
        /// The path that was checked.
        path: PathBuf,
    },

    /// A directory could not be created and does not exist afterwards.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        /// The directory that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Transcoding one rendition failed. Fatal to the run.
    #[error("Transcode failed for rendition {rendition}: {source}")]
    Transcode {
        /// Name of the rendition that failed (e.g. "480p").
        rendition: String,
        /// The engine error.
        #[source]
        source: Box<Error>,
    },

    /// The packaging stage failed. Fatal to the run.
    #[error("Packaging failed: {source}")]
    Packaging {
        /// The engine error.
        #[source]
        source: Box<Error>,
    },

    /// Raw key material or the PSSH blob is malformed.
    #[error("Invalid encryption parameters: {0}")]
    InvalidEncryption(String),

    /// An external tool (ffmpeg, packager) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The run was cancelled before it completed.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors (task panics, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to a process exit code (sysexits-style).
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidLadder(_) | Error::InvalidEncryption(_) => 64,
            Error::InputNotFound { .. } => 66,
            Error::DirectoryCreation { .. } | Error::Io { .. } => 74,
            Error::Transcode { .. } | Error::Packaging { .. } | Error::Tool { .. } => 69,
            Error::Cancelled => 130,
            Error::Internal(_) => 70,
        }
    }

    /// Whether the caller can fix the input and retry.
    pub fn is_caller_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidLadder(_) | Error::InputNotFound { .. } | Error::InvalidEncryption(_)
        )
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Wrap an engine error as a failure of the named rendition.
    pub fn transcode(rendition: impl Into<String>, source: Error) -> Self {
        Error::Transcode {
            rendition: rendition.into(),
            source: Box::new(source),
        }
    }

    /// Wrap an engine error as a packaging failure.
    pub fn packaging(source: Error) -> Self {
        Error::Packaging {
            source: Box::new(source),
        }
    }

    /// Convenience constructor for [`Error::InputNotFound`].
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Error::InputNotFound { path: path.into() }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
