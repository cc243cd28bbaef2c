//! Tag, untag, toggle and done commands

use std::path::Path;

use crate::{FanoutError, db::Database};

use super::registered_item;

type Result<T> = std::result::Result<T, FanoutError>;

/// Execute the tag command - add tags to a file, creating unknown tags
///
/// # Errors
/// Returns an error if the file is not in the working folder, a tag name is
/// invalid, or database operations fail
pub fn execute(db: &Database, working: &Path, file: &Path, tags: &[String], quiet: bool) -> Result<()> {
    let item = registered_item(db, working, file)?;

    let mut added = Vec::new();
    for name in tags {
        db.create_tag(name)?;
        if db.add_tag_to_item(item.path(), name)? {
            added.push(name.trim());
        }
    }

    if !quiet {
        if added.is_empty() {
            println!("{} already had every tag", item.path());
        } else {
            println!("Tagged {} with: {}", item.path(), added.join(", "));
        }
    }
    Ok(())
}

/// Execute the untag command - remove tags from a file
///
/// # Errors
/// Returns an error if the file or a tag is unknown, or database operations fail
pub fn untag(db: &Database, working: &Path, file: &Path, tags: &[String], quiet: bool) -> Result<()> {
    let item = registered_item(db, working, file)?;

    let mut removed = Vec::new();
    for name in tags {
        if db.remove_tag_from_item(item.path(), name)? {
            removed.push(name.trim());
        }
    }

    if !quiet {
        if removed.is_empty() {
            println!("{} had none of those tags", item.path());
        } else {
            println!("Removed from {}: {}", item.path(), removed.join(", "));
        }
    }
    Ok(())
}

/// Execute the toggle command - flip one tag on a file
///
/// # Errors
/// Returns an error if the file is not in the working folder, the tag name is
/// invalid, or database operations fail
pub fn toggle(db: &Database, working: &Path, file: &Path, tag: &str, quiet: bool) -> Result<()> {
    let item = registered_item(db, working, file)?;
    db.create_tag(tag)?;
    let now_tagged = db.toggle_tag(item.path(), tag)?;

    if !quiet {
        let verb = if now_tagged { "Added" } else { "Removed" };
        println!("{verb} '{}' on {}", tag.trim(), item.path());
    }
    Ok(())
}

/// Execute the done command - set or clear the done flag
///
/// # Errors
/// Returns an error if the file is not in the working folder or database operations fail
pub fn done(db: &Database, working: &Path, file: &Path, undo: bool, quiet: bool) -> Result<()> {
    let item = registered_item(db, working, file)?;
    db.mark_done(item.path(), !undo)?;

    if !quiet {
        let state = if undo { "not done" } else { "done" };
        println!("Marked {} as {state}", item.path());
    }
    Ok(())
}
