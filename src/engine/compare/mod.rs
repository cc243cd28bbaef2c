//! Byte-exact file comparison
//!
//! `FileComparer` answers "do these two files hold the same bytes?" without
//! hashing. It rejects on length first, short-circuits when both paths name
//! the same file, and otherwise reads both files in lock-step chunks into two
//! reusable buffers, handing each chunk pair to the `ChunkEq` strategy
//! selected at startup.
//!
//! The comparer sits on the publish hot path (once per already-existing
//! destination), so its buffers live as long as the comparer itself.

pub mod strategy;

use std::fs::{self, File, Metadata};
use std::io::{ErrorKind, Read};
use std::path::Path;

use tracing::trace;

use super::{DEFAULT_CHUNK_SIZE, EngineError};
pub use strategy::{ChunkEq, ScalarEq, detect};

/// Chunked, vectorized file equality check with reusable buffers
pub struct FileComparer {
    strategy: &'static dyn ChunkEq,
    first: Vec<u8>,
    second: Vec<u8>,
    chunks_compared: u64,
}

impl std::fmt::Debug for FileComparer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileComparer")
            .field("strategy", &self.strategy.name())
            .field("chunk_size", &self.first.len())
            .field("chunks_compared", &self.chunks_compared)
            .finish()
    }
}

impl Default for FileComparer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileComparer {
    /// Comparer using the detected strategy and 128 KiB chunks
    #[must_use]
    pub fn new() -> Self {
        Self::with_strategy(detect(), DEFAULT_CHUNK_SIZE)
    }

    /// Comparer using the detected strategy; `0` selects the default chunk size
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self::with_strategy(detect(), chunk_size)
    }

    #[must_use]
    pub fn with_strategy(strategy: &'static dyn ChunkEq, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            strategy,
            first: vec![0; chunk_size],
            second: vec![0; chunk_size],
            chunks_compared: 0,
        }
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.first.len()
    }

    /// Total chunk pairs compared over this comparer's lifetime
    #[must_use]
    pub const fn chunks_compared(&self) -> u64 {
        self.chunks_compared
    }

    /// Whether `a` and `b` hold identical bytes
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if either path is missing or is not a
    /// regular file, and `EngineError::Io` if reading fails.
    pub fn files_are_equal(
        &mut self,
        a: impl AsRef<Path>,
        b: impl AsRef<Path>,
    ) -> Result<bool, EngineError> {
        let (a, b) = (a.as_ref(), b.as_ref());
        let meta_a = regular_file_metadata(a)?;
        let meta_b = regular_file_metadata(b)?;

        if meta_a.len() != meta_b.len() {
            return Ok(false);
        }

        if is_same_file(a, &meta_a, b, &meta_b) {
            return Ok(true);
        }

        let mut file_a = File::open(a).map_err(|e| EngineError::io(a, e))?;
        let mut file_b = File::open(b).map_err(|e| EngineError::io(b, e))?;

        loop {
            let count_a = read_full(&mut file_a, &mut self.first).map_err(|e| EngineError::io(a, e))?;
            let count_b = read_full(&mut file_b, &mut self.second).map_err(|e| EngineError::io(b, e))?;

            // Equal lengths were checked up front; a mismatch here means a
            // concurrent truncation or append.
            if count_a != count_b {
                return Ok(false);
            }
            if count_a == 0 {
                return Ok(true);
            }

            self.chunks_compared += 1;
            if !self.strategy.equal(&self.first[..count_a], &self.second[..count_b]) {
                trace!(a = %a.display(), b = %b.display(), "chunk mismatch");
                return Ok(false);
            }
        }
    }
}

fn regular_file_metadata(path: &Path) -> Result<Metadata, EngineError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(meta),
        Ok(_) => Err(EngineError::NotFound(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(EngineError::NotFound(path.to_path_buf())),
        Err(e) => Err(EngineError::io(path, e)),
    }
}

#[cfg(unix)]
fn is_same_file(_a: &Path, meta_a: &Metadata, _b: &Path, meta_b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino()
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, _meta_a: &Metadata, b: &Path, _meta_b: &Metadata) -> bool {
    // Windows and macOS default volumes are case-insensitive
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca
            .to_string_lossy()
            .eq_ignore_ascii_case(&cb.to_string_lossy()),
        _ => false,
    }
}

/// Fill `buffer` from `reader`, stopping early only at end of stream
fn read_full(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
