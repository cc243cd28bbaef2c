//! Tags command - tag management for the working folder

use crate::{FanoutError, cli::TagsCommands, db::Database, output, tags::Tag};
use colored::Colorize;
use dialoguer::Confirm;

type Result<T> = std::result::Result<T, FanoutError>;

/// Execute the tags management command
///
/// # Errors
/// Returns an error if database operations fail or user interaction fails
pub fn execute(db: &Database, command: &TagsCommands, quiet: bool) -> Result<()> {
    match command {
        TagsCommands::List { filter } => list_all_tags(db, filter.as_deref(), quiet),
        TagsCommands::Show { tag } => show_tag(db, tag, quiet),
        TagsCommands::Add { names } => add_tags(db, names, quiet),
        TagsCommands::Remove { tag } => remove_tag(db, tag, quiet),
    }
}

/// Tags whose name contains `filter`, all of them without one
///
/// # Errors
/// Returns an error if the tags cannot be read
pub fn filtered_tags(db: &Database, filter: Option<&str>) -> Result<Vec<Tag>> {
    let mut tags = db.all_tags()?;
    if let Some(filter) = filter {
        tags.retain(|t| t.matches_filter(filter));
    }
    Ok(tags)
}

fn list_all_tags(db: &Database, filter: Option<&str>, quiet: bool) -> Result<()> {
    let tags = filtered_tags(db, filter)?;

    if tags.is_empty() {
        if !quiet {
            println!("No tags found in database.");
        }
        return Ok(());
    }

    if !quiet {
        println!("Tags in database:");
    }
    for tag in &tags {
        let count = db.tag_usage(tag)?;
        println!("{}", output::tag_with_count(tag.name(), count, quiet));
    }
    Ok(())
}

fn show_tag(db: &Database, name: &str, quiet: bool) -> Result<()> {
    let tag = db
        .get_tag(name)?
        .ok_or_else(|| FanoutError::InvalidInput(format!("Tag '{name}' not found")))?;
    let paths = db.item_paths_for_tag(&tag)?;

    if !quiet {
        println!("{} ({} file(s)):", tag.name().bold(), paths.len());
    }
    for path in &paths {
        match db.get_item(path)? {
            Some(item) => println!("{}", output::item_with_tags(&item, quiet)),
            None => println!("{path}"),
        }
    }
    Ok(())
}

fn add_tags(db: &Database, names: &[String], quiet: bool) -> Result<()> {
    for name in names {
        match db.create_tag(name)? {
            Some(tag) => {
                if !quiet {
                    println!("{} {}", "✓ Created:".green(), tag.name());
                }
            }
            None => {
                if !quiet {
                    println!("{} {} (already exists)", "⊘ Skipped:".yellow(), name.trim());
                }
            }
        }
    }
    Ok(())
}

fn remove_tag(db: &Database, name: &str, quiet: bool) -> Result<()> {
    let tag = db
        .get_tag(name)?
        .ok_or_else(|| FanoutError::InvalidInput(format!("Tag '{name}' not found")))?;
    let count = db.tag_usage(&tag)?;

    if !quiet && count > 0 {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove tag '{}' from {count} file(s)?", tag.name()))
            .interact()
            .map_err(|e| FanoutError::InvalidInput(format!("Failed to get confirmation: {e}")))?;
        if !confirmed {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    db.delete_tag(tag.name())?;
    if !quiet {
        println!("Removed tag '{}' from {count} file(s)", tag.name());
    }
    Ok(())
}
