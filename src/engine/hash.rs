//! Content fingerprinting
//!
//! Streams a file through BLAKE3 in fixed-size chunks and returns the digest
//! as lowercase hex. The fingerprint depends only on the file's bytes, never
//! on its path or metadata, so it recognizes an image that was moved or
//! renamed inside the working folder.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use tracing::debug;

use super::{CancellationToken, DEFAULT_CHUNK_SIZE, EngineError};

/// Streaming BLAKE3 hasher with a configurable read size
#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    chunk_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Use `chunk_size` bytes per read; `0` selects the default (128 KiB)
    #[must_use]
    pub const fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: if chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                chunk_size
            },
        }
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Compute the fingerprint of the file at `path`
    ///
    /// The token is polled before every chunk read.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Io` if the file cannot be opened or read, and
    /// `EngineError::Cancelled` if cancellation is requested mid-stream.
    pub fn compute_hash(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<String, EngineError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| EngineError::io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total: u64 = 0;

        loop {
            cancel.check()?;
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(EngineError::io(path, e)),
            };
            hasher.update(&buffer[..read]);
            total += read as u64;
        }

        let hash = hasher.finalize().to_hex().to_string();
        debug!(path = %path.display(), bytes = total, %hash, "hashed file");
        Ok(hash)
    }
}
