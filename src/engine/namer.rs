//! Destination naming
//!
//! Decides where a source file lands inside a tag folder. An existing file
//! with the same name is reused only when it is byte-identical to the
//! source; otherwise `name (1).ext`, `name (2).ext`, … are tried until a free
//! slot or an identical copy turns up. Existing content is never overwritten.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{EngineError, FileComparer};

/// Upper bound on collision suffixes tried before giving up
pub const DEFAULT_MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Where a source file should go, and whether it still needs copying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    pub should_copy: bool,
}

impl Resolution {
    const fn copy_to(path: PathBuf) -> Self {
        Self {
            path,
            should_copy: true,
        }
    }

    const fn already_at(path: PathBuf) -> Self {
        Self {
            path,
            should_copy: false,
        }
    }
}

/// Resolves collision-free destination paths
#[derive(Debug)]
pub struct DestinationNamer {
    comparer: FileComparer,
    max_suffix: u32,
}

impl Default for DestinationNamer {
    fn default() -> Self {
        Self::new(FileComparer::new(), DEFAULT_MAX_COLLISION_SUFFIX)
    }
}

impl DestinationNamer {
    #[must_use]
    pub fn new(comparer: FileComparer, max_suffix: u32) -> Self {
        Self {
            comparer,
            max_suffix,
        }
    }

    #[must_use]
    pub const fn comparer(&self) -> &FileComparer {
        &self.comparer
    }

    /// Resolve the destination for `source` inside `destination_dir`
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if `source` has no file name or does
    /// not exist, `EngineError::Io` if probing or comparing fails, and
    /// `EngineError::NameResolutionExhausted` once `max_suffix` candidates
    /// were all taken by different content.
    pub fn resolve(
        &mut self,
        source: impl AsRef<Path>,
        destination_dir: impl AsRef<Path>,
    ) -> Result<Resolution, EngineError> {
        let (source, destination_dir) = (source.as_ref(), destination_dir.as_ref());
        let file_name = source
            .file_name()
            .ok_or_else(|| EngineError::NotFound(source.to_path_buf()))?;

        let candidate = destination_dir.join(file_name);
        if let Some(resolution) = self.probe(source, candidate)? {
            return Ok(resolution);
        }

        for n in 1..=self.max_suffix {
            let candidate = destination_dir.join(suffixed_name(Path::new(file_name), n));
            if let Some(resolution) = self.probe(source, candidate)? {
                return Ok(resolution);
            }
        }

        Err(EngineError::NameResolutionExhausted {
            file: source.to_path_buf(),
            attempts: self.max_suffix,
        })
    }

    /// `Some` if `candidate` is free or already holds the source's bytes
    fn probe(&mut self, source: &Path, candidate: PathBuf) -> Result<Option<Resolution>, EngineError> {
        match fs::symlink_metadata(&candidate) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(destination = %candidate.display(), "free destination");
                Ok(Some(Resolution::copy_to(candidate)))
            }
            Err(e) => Err(EngineError::io(&candidate, e)),
            // Directories and symlinks occupy the name but are never reused
            Ok(meta) if !meta.is_file() => Ok(None),
            Ok(_) => {
                if self.comparer.files_are_equal(source, &candidate)? {
                    debug!(destination = %candidate.display(), "identical file already present");
                    Ok(Some(Resolution::already_at(candidate)))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

/// `photo.jpg` → `photo (n).jpg`; `README` → `README (n)`
#[must_use]
pub fn suffixed_name(file_name: &Path, n: u32) -> OsString {
    let mut name = file_name
        .file_stem()
        .map_or_else(|| file_name.as_os_str().to_os_string(), ToOwned::to_owned);
    name.push(format!(" ({n})"));
    if let Some(extension) = file_name.extension() {
        name.push(".");
        name.push(extension);
    }
    name
}
