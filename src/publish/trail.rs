//! Human-readable publish log
//!
//! Every begin-tag, file outcome, wipe outcome and the terminal result are
//! appended as one line, so a long run leaves a readable audit trail instead
//! of stopping at the first problem.

use std::fmt;

use byte_unit::{Byte, UnitType};
use chrono::{DateTime, Local};
use serde::Serialize;

use super::{FileStatus, PublishEvent, PublishObserver, PublishOutcome, PublishStats};
use crate::engine::{EngineError, EntryKind, WipeOutcome};
use crate::tags::Tag;

const BANNER: &str = "====================";

/// Counts and timing of a finished publish
#[derive(Debug, Clone, Serialize)]
pub struct PublishSummary {
    pub started: DateTime<Local>,
    pub finished: Option<DateTime<Local>>,
    pub stats: PublishStats,
    pub error: Option<String>,
}

impl PublishSummary {
    fn start() -> Self {
        Self {
            started: Local::now(),
            finished: None,
            stats: PublishStats::default(),
            error: None,
        }
    }

    /// Bytes copied, in the largest fitting binary unit
    #[must_use]
    pub fn bytes_copied(&self) -> String {
        Byte::from_u64(self.stats.bytes_copied)
            .get_appropriate_unit(UnitType::Binary)
            .to_string()
    }

    /// Elapsed seconds, once finished
    #[must_use]
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.finished
            .map(|end| (end - self.started).num_milliseconds() as f64 / 1000.0)
    }
}

impl fmt::Display for PublishSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        write!(
            f,
            "{} tag(s): {} copied ({}), {} already present, {} missing, {} failed",
            s.tags_published,
            s.copied,
            self.bytes_copied(),
            s.already_present,
            s.missing,
            s.failed
        )?;
        if let Some(wipe) = &s.wipe {
            write!(
                f,
                "; wiped {} file(s), {} folder(s), {} failure(s)",
                wipe.files_deleted, wipe.directories_deleted, wipe.failures
            )?;
        }
        if let Some(secs) = self.elapsed_secs() {
            write!(f, " in {secs:.1}s")?;
        }
        Ok(())
    }
}

/// Accumulates the trailing log of one publish
#[derive(Debug, Clone)]
pub struct TrailLog {
    lines: Vec<String>,
    summary: PublishSummary,
    completed: bool,
}

impl Default for TrailLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            summary: PublishSummary::start(),
            completed: false,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub const fn summary(&self) -> &PublishSummary {
        &self.summary
    }

    /// Whether the terminal line has been written
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Record one worker event; returns the line it produced
    pub fn apply(&mut self, event: &PublishEvent) -> &str {
        match event {
            PublishEvent::BeginTag(tag) => self.on_begin_tag(tag),
            PublishEvent::FileCompleted(outcome) => self.on_file_completed(outcome),
            PublishEvent::FileDeleted(outcome) => self.on_file_deleted(outcome),
            PublishEvent::DirectoryDeleted(outcome) => self.on_directory_deleted(outcome),
            PublishEvent::Finished(result) => self.finish(result),
        }
        self.lines.last().map_or("", String::as_str)
    }

    /// Write the terminal line; later calls are ignored
    pub fn finish(&mut self, result: &Result<PublishStats, EngineError>) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.summary.finished = Some(Local::now());
        match result {
            Ok(stats) => {
                self.summary.stats = *stats;
                self.push(if stats.cancelled { "Cancelled" } else { "Done" }.to_string());
            }
            Err(e) => {
                self.summary.error = Some(e.to_string());
                self.push(format!("Error: {e}"));
            }
        }
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    fn on_wipe(&mut self, outcome: &WipeOutcome) {
        let line = match &outcome.error {
            None => format!("deleted {}", outcome.path.display()),
            Some(e) => format!("failed to delete {}: {e}", outcome.path.display()),
        };
        self.push(line);
    }
}

impl PublishObserver for TrailLog {
    fn on_begin_tag(&mut self, tag: &Tag) {
        self.push(format!("{BANNER} {tag} {BANNER}"));
    }

    fn on_file_completed(&mut self, outcome: &PublishOutcome) {
        let source = outcome.source.display();
        let destination = outcome
            .destination
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        let line = match &outcome.status {
            FileStatus::Copied { .. } => format!("{source} copied to {destination}"),
            FileStatus::AlreadyPresent => format!("{source} already at {destination}"),
            FileStatus::SourceMissing => format!("{source} not found, skipped"),
            FileStatus::Failed { error } => format!("{source} failed: {error}"),
            FileStatus::Cancelled => format!("{source} cancelled"),
        };
        self.push(line);
    }

    fn on_file_deleted(&mut self, outcome: &WipeOutcome) {
        debug_assert_eq!(outcome.kind, EntryKind::File);
        self.on_wipe(outcome);
    }

    fn on_directory_deleted(&mut self, outcome: &WipeOutcome) {
        debug_assert_eq!(outcome.kind, EntryKind::Directory);
        self.on_wipe(outcome);
    }
}
