//! Hash command - fingerprint a file and recall tags from identical content

use std::path::Path;

use colored::Colorize;

use crate::config::FanoutConfig;
use crate::db::Database;
use crate::engine::{CancellationToken, ContentHasher};
use crate::{FanoutError, identity};

use super::registered_item;

type Result<T> = std::result::Result<T, FanoutError>;

/// Execute the hash command
///
/// Prints the fingerprint; in normal mode also lists the tags that were
/// carried over from files with the same content.
///
/// # Errors
/// Returns an error if the file cannot be read or database operations fail
pub fn execute(db: &Database, working: &Path, file: &Path, config: &FanoutConfig, quiet: bool) -> Result<()> {
    let item = registered_item(db, working, file)?;
    let hasher = ContentHasher::with_chunk_size(config.chunk_size);
    let recall = identity::recall_tags(working, &item, db, &hasher, &CancellationToken::new())?;

    if quiet {
        println!("{}", recall.hash);
        return Ok(());
    }

    println!("{}  {}", recall.hash, item.path());
    let twins = db
        .items_with_hash(&recall.hash)?
        .into_iter()
        .filter(|p| p != item.path())
        .collect::<Vec<_>>();
    if !twins.is_empty() {
        println!("  Same content as: {}", twins.join(", "));
    }
    if recall.added.is_empty() {
        if recall.item.is_done() && !twins.is_empty() {
            println!("  {}", "Item is done, tags left as they are".dimmed());
        }
    } else {
        let names: Vec<&str> = recall.added.iter().map(|t| t.name()).collect();
        println!("  {} {}", "✓ Recalled tags:".green(), names.join(", "));
    }
    Ok(())
}
