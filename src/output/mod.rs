//! Output formatting for CLI display
//!
//! This module provides utilities for formatting output in the CLI:
//! item and tag listings, colored trail lines, the publish summary, and the
//! JSON form of publish events.

use colored::Colorize;
use serde_json::{Value, json};

use crate::engine::WipeOutcome;
use crate::publish::{FileStatus, PublishEvent, PublishSummary};
use crate::tags::TaggedItem;

/// Format an item with its tags for display
#[must_use]
pub fn item_with_tags(item: &TaggedItem, quiet: bool) -> String {
    if quiet {
        return item.path().to_string();
    }
    let names: Vec<&str> = item.tags().iter().map(|t| t.name()).collect();
    let mut line = if names.is_empty() {
        format!("  {} (no tags)", item.path())
    } else {
        format!("  {} [{}]", item.path(), names.join(", "))
    };
    if item.is_done() {
        line.push_str(&format!(" {}", "✓ done".green()));
    }
    line
}

/// Format a tag with usage count
#[must_use]
pub fn tag_with_count(tag: &str, count: usize, quiet: bool) -> String {
    if quiet {
        tag.to_string()
    } else {
        format!("  {tag} (used by {count} file(s))")
    }
}

/// Color a trail line according to the event it came from
#[must_use]
pub fn colorize_trail_line(line: &str, event: &PublishEvent) -> String {
    match event {
        PublishEvent::BeginTag(_) => line.bold().to_string(),
        PublishEvent::FileCompleted(outcome) => match outcome.status {
            FileStatus::Copied { .. } => line.green().to_string(),
            FileStatus::AlreadyPresent => line.dimmed().to_string(),
            FileStatus::SourceMissing | FileStatus::Cancelled => line.yellow().to_string(),
            FileStatus::Failed { .. } => line.red().to_string(),
        },
        PublishEvent::FileDeleted(outcome) | PublishEvent::DirectoryDeleted(outcome) => {
            if outcome.success {
                line.to_string()
            } else {
                line.red().to_string()
            }
        }
        PublishEvent::Finished(Ok(_)) => line.green().bold().to_string(),
        PublishEvent::Finished(Err(_)) => line.red().bold().to_string(),
    }
}

/// Print the publish summary block
pub fn print_summary(summary: &PublishSummary) {
    let stats = &summary.stats;
    println!("\n{}", "=== Publish Summary ===".bold());
    println!("  {} {}", "Tags:".bold(), stats.tags_published);
    println!(
        "  {} {} ({})",
        "✓ Copied:".green(),
        stats.copied,
        summary.bytes_copied()
    );
    if stats.already_present > 0 {
        println!("  {} {}", "⊘ Already present:".yellow(), stats.already_present);
    }
    if stats.missing > 0 {
        println!("  {} {}", "⊘ Missing:".yellow(), stats.missing);
    }
    if stats.failed > 0 {
        println!("  {} {}", "✗ Failed:".red(), stats.failed);
    }
    if let Some(wipe) = &stats.wipe {
        println!(
            "  {} {} file(s), {} folder(s)",
            "Wiped:".bold(),
            wipe.files_deleted,
            wipe.directories_deleted
        );
        if wipe.failures > 0 {
            println!("  {} {}", "✗ Wipe failures:".red(), wipe.failures);
        }
    }
    if stats.cancelled {
        println!("  {}", "Cancelled before completion".yellow());
    }
    if let Some(secs) = summary.elapsed_secs() {
        println!("  {} {secs:.1}s", "Elapsed:".bold());
    }
}

fn wipe_json(event: &str, outcome: &WipeOutcome) -> Value {
    let mut value = serde_json::to_value(outcome).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("event".to_string(), json!(event));
    }
    value
}

/// JSON form of one publish event
///
/// `summary` is used for the `finished` event.
#[must_use]
pub fn event_json(event: &PublishEvent, summary: &PublishSummary) -> Value {
    match event {
        PublishEvent::BeginTag(tag) => json!({ "event": "begin_tag", "tag": tag.name() }),
        PublishEvent::FileCompleted(outcome) => {
            let mut value = serde_json::to_value(outcome).unwrap_or(Value::Null);
            if let Value::Object(map) = &mut value {
                map.insert("event".to_string(), json!("file"));
                map.insert("copied".to_string(), json!(outcome.copied()));
            }
            value
        }
        PublishEvent::FileDeleted(outcome) => wipe_json("file_deleted", outcome),
        PublishEvent::DirectoryDeleted(outcome) => wipe_json("directory_deleted", outcome),
        PublishEvent::Finished(Ok(_)) => json!({ "event": "finished", "summary": summary }),
        PublishEvent::Finished(Err(e)) => json!({ "event": "finished", "error": e.to_string() }),
    }
}
