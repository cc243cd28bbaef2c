//! Recursive destination wipe
//!
//! Empties a directory tree before a "drop everything first" publish.
//! Post-order: the files of a directory go first, then each subdirectory is
//! emptied and removed. Every deletion is reported through the callback,
//! success or failure, and a failure never stops the walk. The root itself is
//! kept, since the publish that follows writes straight back into it.
//!
//! A failure is not confined to the entry that was denied: every directory
//! above it still holds that entry, so its removal fails and is reported as
//! well. A denied `locked/stuck.jpg` yields two failures, the file and
//! `locked`. Siblings are unaffected.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use super::CancellationToken;

/// Kind of filesystem entry a wipe outcome refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Result of deleting one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WipeOutcome {
    pub kind: EntryKind,
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

impl WipeOutcome {
    fn from_result(kind: EntryKind, path: PathBuf, result: std::io::Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                kind,
                path,
                success: true,
                error: None,
            },
            Err(e) => Self {
                kind,
                path,
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Counters for one wipe run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WipeStats {
    pub files_deleted: usize,
    pub directories_deleted: usize,
    pub failures: usize,
    pub cancelled: bool,
}

impl WipeStats {
    fn record(&mut self, outcome: &WipeOutcome) {
        match (outcome.success, outcome.kind) {
            (true, EntryKind::File) => self.files_deleted += 1,
            (true, EntryKind::Directory) => self.directories_deleted += 1,
            (false, _) => self.failures += 1,
        }
    }
}

/// Empty `root`, reporting each deletion to `on_entry`
///
/// Cancellation is polled before every deletion and before every descent;
/// once observed, nothing further is deleted. Running it on an empty or
/// missing root does nothing.
pub fn wipe(
    root: impl AsRef<Path>,
    on_entry: &mut dyn FnMut(&WipeOutcome),
    cancel: &CancellationToken,
) -> WipeStats {
    let root = root.as_ref();
    let mut stats = WipeStats::default();
    if root.is_dir() {
        wipe_directory(root, false, on_entry, cancel, &mut stats);
    }
    stats.cancelled = cancel.is_cancelled();
    debug!(root = %root.display(), ?stats, "wipe finished");
    stats
}

fn wipe_directory(
    dir: &Path,
    remove_self: bool,
    on_entry: &mut dyn FnMut(&WipeOutcome),
    cancel: &CancellationToken,
    stats: &mut WipeStats,
) {
    let (files, directories) = match list_entries(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot list directory");
            report(
                WipeOutcome::from_result(EntryKind::Directory, dir.to_path_buf(), Err(e)),
                on_entry,
                stats,
            );
            return;
        }
    };

    for file in files {
        if cancel.is_cancelled() {
            return;
        }
        let result = fs::remove_file(&file);
        report(WipeOutcome::from_result(EntryKind::File, file, result), on_entry, stats);
    }

    for sub in directories {
        if cancel.is_cancelled() {
            return;
        }
        wipe_directory(&sub, true, on_entry, cancel, stats);
    }

    if remove_self && !cancel.is_cancelled() {
        let result = fs::remove_dir(dir);
        report(
            WipeOutcome::from_result(EntryKind::Directory, dir.to_path_buf(), result),
            on_entry,
            stats,
        );
    }
}

fn report(outcome: WipeOutcome, on_entry: &mut dyn FnMut(&WipeOutcome), stats: &mut WipeStats) {
    if let Some(error) = &outcome.error {
        warn!(path = %outcome.path.display(), %error, "delete failed");
    }
    stats.record(&outcome);
    on_entry(&outcome);
}

/// Files (including symlinks, which are never followed) and subdirectories, sorted by name
fn list_entries(dir: &Path) -> std::io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let mut directories = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            directories.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }
    files.sort();
    directories.sort();
    Ok((files, directories))
}
