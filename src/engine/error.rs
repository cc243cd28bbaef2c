//! Engine error types
//!
//! Errors raised by the hashing, comparison, naming, copy and publish steps.
//! The wiper never returns one of these: it reports failures per entry.
//!
//! # Error Types
//!
//! - **`NotFound`**: A file expected to exist for comparison does not
//! - **`Io`**: Open/read/write/delete failures, carrying the offending path
//! - **`Cancelled`**: Cooperative cancellation observed at a poll point
//! - **`NameResolutionExhausted`**: The collision suffix counter hit its bound
//! - **`Store`**: The tag store failed while the engine was reading from it
//! - **`InvalidTagName`**: A tag name cannot be used as a folder name
//! - **`WorkerLost`**: A background publish died before finishing

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by the file-identity and publish engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A file expected to exist does not (or is not a regular file)
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An I/O operation failed on a specific path
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Cancellation was requested
    #[error("Operation cancelled")]
    Cancelled,

    /// No free or identical destination name within the configured bound
    #[error("No destination name available for {} after {attempts} attempts", .file.display())]
    NameResolutionExhausted { file: PathBuf, attempts: u32 },

    /// The tag store failed
    #[error("Tag store error: {0}")]
    Store(String),

    /// Tag name is not usable as a directory name
    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    /// The background publish worker stopped without reporting a result
    #[error("Publish worker stopped unexpectedly")]
    WorkerLost,
}

impl EngineError {
    /// Wrap an `io::Error` with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether this error is a cooperative cancellation
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
