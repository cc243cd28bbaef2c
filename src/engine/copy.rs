//! Streaming copy with timestamp preservation
//!
//! The destination is created exclusively (an existing file is an error,
//! never truncated). Cancellation is polled between buffer-sized writes; an
//! interrupted or failed copy removes its partial destination so nothing
//! half-written is left under a published name.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use filetime::FileTime;
use tracing::{debug, warn};

use super::{CancellationToken, DEFAULT_CHUNK_SIZE, EngineError};

/// Copies files through one reusable buffer
#[derive(Debug)]
pub struct FileCopier {
    buffer: Vec<u8>,
}

impl Default for FileCopier {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl FileCopier {
    /// `0` selects the default buffer size
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        let size = if buffer_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            buffer_size
        };
        Self {
            buffer: vec![0; size],
        }
    }

    /// Copy `source` to the new file `destination`, carrying over the
    /// source's last-write time. Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Io` on open/read/write/timestamp failures
    /// (including when `destination` already exists) and
    /// `EngineError::Cancelled` if cancellation interrupts the transfer.
    pub fn copy(
        &mut self,
        source: &Path,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, EngineError> {
        let mut input = File::open(source).map_err(|e| EngineError::io(source, e))?;
        let metadata = input.metadata().map_err(|e| EngineError::io(source, e))?;
        let mut output = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .map_err(|e| EngineError::io(destination, e))?;

        let result = self
            .transfer(&mut input, &mut output, source, destination, cancel)
            .and_then(|bytes| {
                output.flush().map_err(|e| EngineError::io(destination, e))?;
                Ok(bytes)
            });
        drop(output);

        match result {
            Ok(bytes) => {
                let mtime = FileTime::from_last_modification_time(&metadata);
                filetime::set_file_mtime(destination, mtime)
                    .map_err(|e| EngineError::io(destination, e))?;
                debug!(source = %source.display(), destination = %destination.display(), bytes, "copied");
                Ok(bytes)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(destination) {
                    warn!(destination = %destination.display(), error = %cleanup, "could not remove partial copy");
                }
                Err(e)
            }
        }
    }

    fn transfer(
        &mut self,
        input: &mut File,
        output: &mut File,
        source: &Path,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, EngineError> {
        let mut total = 0u64;
        loop {
            cancel.check()?;
            let read = match input.read(&mut self.buffer) {
                Ok(0) => return Ok(total),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(EngineError::io(source, e)),
            };
            output
                .write_all(&self.buffer[..read])
                .map_err(|e| EngineError::io(destination, e))?;
            total += read as u64;
        }
    }
}
