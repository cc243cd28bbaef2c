//! Publish command - fan tagged items out into the target folder

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use dialoguer::Select;
use tracing::warn;

use crate::cli::PublishMode;
use crate::config::FanoutConfig;
use crate::db::Database;
use crate::engine::CancellationToken;
use crate::publish::{PublishEvent, PublishJob, PublishRequest, TrailLog};
use crate::{FanoutError, output};

use super::target::{check_target, load_target, normalize_target, save_target};

type Result<T> = std::result::Result<T, FanoutError>;

/// Arguments of `fanout publish`
#[derive(Debug, Clone, Copy)]
pub struct PublishArgs<'a> {
    /// Target given on the command line, saved as the folder's target
    pub target: Option<&'a Path>,
    pub mode: PublishMode,
    /// One JSON object per event instead of the trail log
    pub json: bool,
    /// File the trail log is written to once the run ends
    pub log: Option<&'a Path>,
}

/// Token cancelled by Ctrl-C; the handler is installed on first use
static INTERRUPT: OnceLock<Mutex<Option<CancellationToken>>> = OnceLock::new();

/// Route Ctrl-C to `token` until another token is registered
///
/// The running copy then stops at its next poll point and removes its
/// partial file instead of the process dying mid-write.
pub fn cancel_on_interrupt(token: CancellationToken) {
    let slot = INTERRUPT.get_or_init(|| {
        if let Err(e) = ctrlc::set_handler(interrupt) {
            warn!(error = %e, "could not install Ctrl-C handler");
        }
        Mutex::new(None)
    });
    match slot.lock() {
        Ok(mut current) => *current = Some(token),
        Err(poisoned) => *poisoned.into_inner() = Some(token),
    }
}

/// Cancel the registered token, if any
pub fn interrupt() {
    let Some(slot) = INTERRUPT.get() else {
        return;
    };
    let current = match slot.lock() {
        Ok(current) => current,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(token) = current.as_ref() {
        token.cancel();
    }
}

/// Whether `dir` exists and has at least one subdirectory
#[must_use]
pub fn has_subdirectories(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .filter_map(std::result::Result::ok)
            .any(|e| e.file_type().is_ok_and(|t| t.is_dir()))
    })
}

/// Decide whether to wipe the target; `None` means the user backed out
///
/// Only asks when the target already has folders and neither `--drop` nor
/// `--merge` was given. Quiet mode never asks and merges.
///
/// # Errors
/// Returns an error if the prompt cannot be shown
pub fn decide_drop(target: &Path, mode: PublishMode, quiet: bool) -> Result<Option<bool>> {
    match mode {
        PublishMode::Drop => Ok(Some(true)),
        PublishMode::Merge => Ok(Some(false)),
        PublishMode::Ask if quiet || !has_subdirectories(target) => Ok(Some(false)),
        PublishMode::Ask => {
            let choice = Select::new()
                .with_prompt(format!("{} already contains folders", target.display()))
                .items(&["Merge into what is there", "Drop everything first", "Cancel"])
                .default(0)
                .interact()
                .map_err(|e| FanoutError::InvalidInput(format!("Failed to get selection: {e}")))?;
            Ok(match choice {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            })
        }
    }
}

fn resolve_target(db: &Database, target: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = target {
        return save_target(db, path);
    }
    let stored = load_target(db)?.ok_or_else(|| {
        FanoutError::InvalidInput(
            "No publish target. Pass one or use 'fanout target <PATH>' to set it.".into(),
        )
    })?;
    normalize_target(&stored)
}

fn write_log(path: &Path, trail: &TrailLog) -> Result<()> {
    let mut text = trail.lines().join("\n");
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

/// Execute the publish command
///
/// Streams the trail log to stdout (or JSON events with `json`) while the
/// copy runs on a worker thread, then prints a summary. Ctrl-C cancels the
/// run cleanly.
///
/// # Errors
/// Returns an error if no target is known, the target overlaps the working
/// folder, the prompt fails, the log cannot be written, or the publish itself
/// fails at tag level
pub fn execute(
    db: &Arc<Database>,
    working: &Path,
    args: &PublishArgs<'_>,
    config: &FanoutConfig,
    quiet: bool,
) -> Result<()> {
    let working = working.canonicalize()?;
    let target = resolve_target(db, args.target)?;
    check_target(&working, &target)?;

    let Some(drop_everything_first) = decide_drop(&target, args.mode, quiet || args.json)? else {
        println!("Operation cancelled.");
        return Ok(());
    };

    let request = PublishRequest::new(&working, &target).drop_everything_first(drop_everything_first);
    let job = PublishJob::spawn(Arc::clone(db), request, config.publish_options())?;
    cancel_on_interrupt(job.cancellation_token());

    let mut trail = TrailLog::new();
    let mut failure = None;
    for event in job.events() {
        let line = trail.apply(&event).to_string();
        if args.json {
            println!("{}", output::event_json(&event, trail.summary()));
        } else if !quiet {
            println!("{}", output::colorize_trail_line(&line, &event));
        }
        if let PublishEvent::Finished(Err(e)) = event {
            failure = Some(e);
        }
    }

    if !args.json && !quiet {
        output::print_summary(trail.summary());
    }
    if let Some(path) = args.log {
        write_log(path, &trail)?;
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
