//! Publish orchestration
//!
//! Replicates the tagged working set into `target/<tag>/<file>`:
//!
//! 1. the target folder is created if absent
//! 2. if requested and the target already existed, it is wiped first
//! 3. tags are walked in store order; a tag with no items is skipped
//! 4. each item is resolved through the [`DestinationNamer`] and copied only
//!    when no identical file is already there
//!
//! Per-file problems (missing source, unreadable file, exhausted names) are
//! reported through [`PublishObserver::on_file_completed`] and the run goes
//! on. Tag-level problems (tag folder creation, store errors, an unusable tag
//! name) abort the run with an [`EngineError`].

pub mod trail;
pub mod worker;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::{
    CancellationToken, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_COLLISION_SUFFIX, DestinationNamer,
    EngineError, EntryKind, FileComparer, FileCopier, WipeOutcome, WipeStats, wipe,
};
use crate::store::TagStore;
use crate::tags::{Tag, validate_tag_name};

pub use trail::{PublishSummary, TrailLog};
pub use worker::{PublishEvent, PublishJob};

/// What happened to one source file under one tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Copied { bytes: u64 },
    AlreadyPresent,
    SourceMissing,
    Failed { error: String },
    Cancelled,
}

/// Per-file publish result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub source: PathBuf,
    /// `None` when no destination was settled on
    pub destination: Option<PathBuf>,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl PublishOutcome {
    /// Whether bytes were actually written for this file
    #[must_use]
    pub const fn copied(&self) -> bool {
        matches!(self.status, FileStatus::Copied { .. })
    }

    fn missing(source: PathBuf) -> Self {
        Self {
            source,
            destination: None,
            status: FileStatus::SourceMissing,
        }
    }

    fn failed(source: PathBuf, destination: Option<PathBuf>, error: &EngineError) -> Self {
        let status = if error.is_cancelled() {
            FileStatus::Cancelled
        } else {
            FileStatus::Failed {
                error: error.to_string(),
            }
        };
        Self {
            source,
            destination,
            status,
        }
    }
}

/// Progress hooks, invoked synchronously on the publishing thread
///
/// Every method defaults to doing nothing.
pub trait PublishObserver {
    fn on_begin_tag(&mut self, _tag: &Tag) {}

    fn on_file_completed(&mut self, _outcome: &PublishOutcome) {}

    fn on_file_deleted(&mut self, _outcome: &WipeOutcome) {}

    fn on_directory_deleted(&mut self, _outcome: &WipeOutcome) {}
}

impl PublishObserver for () {}

/// Where to publish from and to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub working_folder: PathBuf,
    pub target_folder: PathBuf,
    pub drop_everything_first: bool,
}

impl PublishRequest {
    #[must_use]
    pub fn new(working_folder: impl Into<PathBuf>, target_folder: impl Into<PathBuf>) -> Self {
        Self {
            working_folder: working_folder.into(),
            target_folder: target_folder.into(),
            drop_everything_first: false,
        }
    }

    #[must_use]
    pub const fn drop_everything_first(mut self, drop: bool) -> Self {
        self.drop_everything_first = drop;
        self
    }
}

/// Tuning knobs for a [`Publisher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    pub chunk_size: usize,
    pub max_collision_suffix: u32,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_collision_suffix: DEFAULT_MAX_COLLISION_SUFFIX,
        }
    }
}

/// Counters for one publish run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishStats {
    pub tags_published: usize,
    pub copied: usize,
    pub already_present: usize,
    pub missing: usize,
    pub failed: usize,
    pub bytes_copied: u64,
    pub wipe: Option<WipeStats>,
    pub cancelled: bool,
}

impl PublishStats {
    fn record(&mut self, outcome: &PublishOutcome) {
        match &outcome.status {
            FileStatus::Copied { bytes } => {
                self.copied += 1;
                self.bytes_copied += bytes;
            }
            FileStatus::AlreadyPresent => self.already_present += 1,
            FileStatus::SourceMissing => self.missing += 1,
            FileStatus::Failed { .. } => self.failed += 1,
            FileStatus::Cancelled => self.cancelled = true,
        }
    }

    /// Files that reached a final outcome
    #[must_use]
    pub const fn files_processed(&self) -> usize {
        self.copied + self.already_present + self.missing + self.failed
    }
}

/// Drives one publish at a time; buffers are reused across files
#[derive(Debug)]
pub struct Publisher {
    namer: DestinationNamer,
    copier: FileCopier,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(PublishOptions::default())
    }
}

impl Publisher {
    #[must_use]
    pub fn new(options: PublishOptions) -> Self {
        Self {
            namer: DestinationNamer::new(
                FileComparer::with_chunk_size(options.chunk_size),
                options.max_collision_suffix,
            ),
            copier: FileCopier::new(options.chunk_size),
        }
    }

    /// Name of the chunk comparison strategy in use ("avx2" or "scalar")
    #[must_use]
    pub fn comparison_strategy(&self) -> &'static str {
        self.namer.comparer().strategy_name()
    }

    /// Publish every tag of `store` into `request.target_folder`
    ///
    /// Cancellation is not an error: the run stops at the next poll point
    /// and the returned stats have `cancelled` set.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Io` if the target or a tag folder cannot be
    /// created, `EngineError::Store` if the store fails, and
    /// `EngineError::InvalidTagName` for a tag that cannot be a folder name.
    pub fn publish<S: TagStore + ?Sized>(
        &mut self,
        store: &S,
        request: &PublishRequest,
        observer: &mut dyn PublishObserver,
        cancel: &CancellationToken,
    ) -> Result<PublishStats, EngineError> {
        let target = request.target_folder.as_path();
        let existed = target.is_dir();
        fs::create_dir_all(target).map_err(|e| EngineError::io(target, e))?;

        debug!(
            target = %target.display(),
            strategy = self.comparison_strategy(),
            "publish starting"
        );
        let mut stats = PublishStats::default();

        if request.drop_everything_first && existed {
            info!(target = %target.display(), "wiping target before publish");
            let wiped = wipe(
                target,
                &mut |outcome: &WipeOutcome| match outcome.kind {
                    EntryKind::File => observer.on_file_deleted(outcome),
                    EntryKind::Directory => observer.on_directory_deleted(outcome),
                },
                cancel,
            );
            stats.cancelled = wiped.cancelled;
            stats.wipe = Some(wiped);
            if stats.cancelled {
                return Ok(stats);
            }
        }

        let tags = store.all_tags().map_err(store_error)?;
        for tag in &tags {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let items = store.item_paths_for_tag(tag).map_err(store_error)?;
            if items.is_empty() {
                debug!(tag = %tag, "no items, skipping tag");
                continue;
            }
            let folder = validate_tag_name(tag.name()).map_err(EngineError::InvalidTagName)?;

            observer.on_begin_tag(tag);
            info!(tag = %tag, items = items.len(), "publishing tag");

            let tag_dir = target.join(folder);
            fs::create_dir_all(&tag_dir).map_err(|e| EngineError::io(&tag_dir, e))?;
            stats.tags_published += 1;

            for item in &items {
                if cancel.is_cancelled() {
                    stats.cancelled = true;
                    break;
                }
                let outcome = self.publish_file(request.working_folder.join(item), &tag_dir, cancel);
                stats.record(&outcome);
                observer.on_file_completed(&outcome);
            }
            if stats.cancelled {
                break;
            }
        }

        info!(
            tags = stats.tags_published,
            copied = stats.copied,
            already_present = stats.already_present,
            missing = stats.missing,
            failed = stats.failed,
            cancelled = stats.cancelled,
            "publish finished"
        );
        Ok(stats)
    }

    fn publish_file(&mut self, source: PathBuf, tag_dir: &Path, cancel: &CancellationToken) -> PublishOutcome {
        if !source.is_file() {
            warn!(source = %source.display(), "source not found, skipped");
            return PublishOutcome::missing(source);
        }

        let resolution = match self.namer.resolve(&source, tag_dir) {
            Ok(resolution) => resolution,
            Err(EngineError::NotFound(_)) => {
                warn!(source = %source.display(), "source vanished, skipped");
                return PublishOutcome::missing(source);
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "could not resolve destination");
                return PublishOutcome::failed(source, None, &e);
            }
        };

        if !resolution.should_copy {
            return PublishOutcome {
                source,
                destination: Some(resolution.path),
                status: FileStatus::AlreadyPresent,
            };
        }

        match self.copier.copy(&source, &resolution.path, cancel) {
            Ok(bytes) => PublishOutcome {
                source,
                destination: Some(resolution.path),
                status: FileStatus::Copied { bytes },
            },
            Err(e) => {
                if !e.is_cancelled() {
                    warn!(source = %source.display(), error = %e, "copy failed");
                }
                PublishOutcome::failed(source, Some(resolution.path), &e)
            }
        }
    }
}

fn store_error(error: impl std::error::Error) -> EngineError {
    EngineError::Store(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTagStore;
    use crate::testing::TestTree;

    /// Records every callback in order
    #[derive(Default)]
    struct Recorder {
        begun: Vec<String>,
        files: Vec<PublishOutcome>,
        deleted: Vec<WipeOutcome>,
        cancel_after_files: Option<(usize, CancellationToken)>,
    }

    impl PublishObserver for Recorder {
        fn on_begin_tag(&mut self, tag: &Tag) {
            self.begun.push(tag.name().to_string());
        }

        fn on_file_completed(&mut self, outcome: &PublishOutcome) {
            self.files.push(outcome.clone());
            if let Some((n, token)) = &self.cancel_after_files
                && self.files.len() == *n
            {
                token.cancel();
            }
        }

        fn on_file_deleted(&mut self, outcome: &WipeOutcome) {
            self.deleted.push(outcome.clone());
        }

        fn on_directory_deleted(&mut self, outcome: &WipeOutcome) {
            self.deleted.push(outcome.clone());
        }
    }

    fn run(store: &MemoryTagStore, request: &PublishRequest) -> (PublishStats, Recorder) {
        let mut recorder = Recorder::default();
        let stats = Publisher::default()
            .publish(store, request, &mut recorder, &CancellationToken::new())
            .unwrap();
        (stats, recorder)
    }

    #[test]
    fn test_comparison_strategy_is_detected() {
        let publisher = Publisher::default();
        assert!(["avx2", "scalar"].contains(&publisher.comparison_strategy()));
    }

    #[test]
    fn test_publish_copies_into_tag_folders() {
        let working = TestTree::new();
        working.file("a.jpg", b"alpha");
        working.file("sub/b.jpg", b"bravo");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.assign("Cats", "a.jpg");
        store.assign("Cats", "sub/b.jpg");

        let request = PublishRequest::new(working.path(), target.path());
        let (stats, recorder) = run(&store, &request);

        assert_eq!(stats.copied, 2);
        assert_eq!(stats.bytes_copied, 10);
        assert_eq!(recorder.begun, vec!["Cats"]);
        assert!(recorder.files.iter().all(PublishOutcome::copied));
        assert_eq!(target.read("Cats/a.jpg"), b"alpha");
        assert_eq!(target.read("Cats/b.jpg"), b"bravo");
    }

    #[test]
    fn test_second_publish_copies_nothing() {
        let working = TestTree::new();
        working.file("a.jpg", b"alpha");
        working.file("b.jpg", b"bravo");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.assign("one", "a.jpg");
        store.assign("two", "a.jpg");
        store.assign("two", "b.jpg");

        let request = PublishRequest::new(working.path(), target.path());
        let (first, _) = run(&store, &request);
        assert_eq!(first.copied, 3);

        let (second, recorder) = run(&store, &request);
        assert_eq!(second.copied, 0);
        assert_eq!(second.already_present, 3);
        assert_eq!(recorder.files.len(), 3);
        assert!(recorder.files.iter().all(|o| !o.copied()));
        assert_eq!(target.count_files(), 3);
    }

    #[test]
    fn test_item_fans_out_to_every_tag() {
        let working = TestTree::new();
        working.file("shared.png", b"pixels");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.assign("left", "shared.png");
        store.assign("right", "shared.png");

        let request = PublishRequest::new(working.path(), target.path());
        let (_, recorder) = run(&store, &request);

        let destinations: Vec<PathBuf> = recorder
            .files
            .iter()
            .filter_map(|o| o.destination.clone())
            .collect();
        assert_eq!(
            destinations,
            vec![
                target.path().join("left/shared.png"),
                target.path().join("right/shared.png"),
            ]
        );
    }

    #[test]
    fn test_cancel_before_second_tag() {
        let working = TestTree::new();
        working.file("1.jpg", b"one");
        working.file("2.jpg", b"two");
        working.file("3.jpg", b"three");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.assign("first", "1.jpg");
        store.assign("first", "2.jpg");
        store.assign("second", "2.jpg");
        store.assign("third", "3.jpg");

        let cancel = CancellationToken::new();
        let mut recorder = Recorder {
            cancel_after_files: Some((2, cancel.clone())),
            ..Recorder::default()
        };
        let request = PublishRequest::new(working.path(), target.path());
        let stats = Publisher::default()
            .publish(&store, &request, &mut recorder, &cancel)
            .unwrap();

        assert!(stats.cancelled);
        assert_eq!(recorder.begun, vec!["first"]);
        assert_eq!(recorder.files.len(), 2);
        assert!(recorder.files.iter().all(PublishOutcome::copied));
        assert!(!target.path().join("second").exists());
        assert!(!target.path().join("third").exists());
    }

    #[test]
    fn test_missing_source_is_reported_and_skipped() {
        let working = TestTree::new();
        working.file("here.jpg", b"present");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.assign("t", "gone.jpg");
        store.assign("t", "here.jpg");

        let request = PublishRequest::new(working.path(), target.path());
        let (stats, recorder) = run(&store, &request);

        assert_eq!(stats.missing, 1);
        assert_eq!(stats.copied, 1);
        assert_eq!(recorder.files[0].status, FileStatus::SourceMissing);
        assert_eq!(recorder.files[0].destination, None);
        assert_eq!(recorder.files[0].source, working.path().join("gone.jpg"));
    }

    #[test]
    fn test_empty_tag_gets_no_folder() {
        let working = TestTree::new();
        working.file("a.jpg", b"a");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.create_tag("empty");
        store.assign("full", "a.jpg");

        let request = PublishRequest::new(working.path(), target.path());
        let (stats, recorder) = run(&store, &request);

        assert_eq!(stats.tags_published, 1);
        assert_eq!(recorder.begun, vec!["full"]);
        assert!(!target.path().join("empty").exists());
    }

    #[test]
    fn test_name_collision_gets_suffix() {
        let working = TestTree::new();
        working.file("2022/photo.jpg", b"old trip");
        working.file("2023/photo.jpg", b"new trip");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.assign("trips", "2022/photo.jpg");
        store.assign("trips", "2023/photo.jpg");

        let request = PublishRequest::new(working.path(), target.path());
        let (stats, _) = run(&store, &request);

        assert_eq!(stats.copied, 2);
        assert_eq!(target.read("trips/photo.jpg"), b"old trip");
        assert_eq!(target.read("trips/photo (1).jpg"), b"new trip");
    }

    #[test]
    fn test_drop_everything_first_wipes_existing_target() {
        let working = TestTree::new();
        working.file("a.jpg", b"a");
        let target = TestTree::new();
        target.file("stale/old.jpg", b"old");
        target.file("loose.txt", b"loose");

        let store = MemoryTagStore::new();
        store.assign("fresh", "a.jpg");

        let request = PublishRequest::new(working.path(), target.path()).drop_everything_first(true);
        let (stats, recorder) = run(&store, &request);

        let wiped = stats.wipe.unwrap();
        assert_eq!(wiped.files_deleted, 2);
        assert_eq!(wiped.directories_deleted, 1);
        assert_eq!(recorder.deleted.len(), 3);
        assert!(!target.path().join("stale").exists());
        assert!(target.path().join("fresh/a.jpg").is_file());
    }

    #[test]
    fn test_drop_on_new_target_skips_wipe() {
        let working = TestTree::new();
        working.file("a.jpg", b"a");
        let target = TestTree::new();
        let fresh = target.path().join("new-root");

        let store = MemoryTagStore::new();
        store.assign("t", "a.jpg");

        let request = PublishRequest::new(working.path(), &fresh).drop_everything_first(true);
        let (stats, _) = run(&store, &request);

        assert_eq!(stats.wipe, None);
        assert!(fresh.join("t/a.jpg").is_file());
    }

    #[test]
    fn test_invalid_tag_name_aborts() {
        let working = TestTree::new();
        working.file("a.jpg", b"a");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.assign("..", "a.jpg");

        let request = PublishRequest::new(working.path(), target.path());
        let result = Publisher::default().publish(&store, &request, &mut (), &CancellationToken::new());
        assert!(matches!(result, Err(EngineError::InvalidTagName(_))));
    }

    #[test]
    fn test_cancelled_before_start_publishes_nothing() {
        let working = TestTree::new();
        working.file("a.jpg", b"a");
        let target = TestTree::new();

        let store = MemoryTagStore::new();
        store.assign("t", "a.jpg");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = PublishRequest::new(working.path(), target.path());
        let stats = Publisher::default().publish(&store, &request, &mut (), &cancel).unwrap();

        assert!(stats.cancelled);
        assert_eq!(stats.files_processed(), 0);
        assert_eq!(target.count_files(), 0);
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = PublishOutcome {
            source: PathBuf::from("a.jpg"),
            destination: Some(PathBuf::from("t/a.jpg")),
            status: FileStatus::Copied { bytes: 3 },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "copied");
        assert_eq!(json["bytes"], 3);
        assert_eq!(json["destination"], "t/a.jpg");
    }
}
