//! Scan command - discover images and list them

use std::path::Path;

use crate::config::FanoutConfig;
use crate::db::{Database, PARAM_SHOW_DONE};
use crate::engine::CancellationToken;
use crate::tags::TaggedItem;
use crate::{FanoutError, output, scan};

type Result<T> = std::result::Result<T, FanoutError>;

/// Execute the scan command
///
/// Done items are hidden unless `all` is set or the folder's `show_done`
/// parameter is on. `show_done` updates that parameter first. `filter` keeps
/// only items whose path contains it.
///
/// # Errors
/// Returns an error if the folder cannot be walked or database operations fail
pub fn execute(
    db: &Database,
    working: &Path,
    config: &FanoutConfig,
    all: bool,
    show_done: Option<bool>,
    filter: Option<&str>,
    quiet: bool,
) -> Result<()> {
    if let Some(show) = show_done {
        db.set_parameter(PARAM_SHOW_DONE, &show.to_string())?;
    }
    let show_done = all
        || db
            .get_parameter(PARAM_SHOW_DONE)?
            .is_some_and(|v| v == "true");

    let items = scan::scan_folder(working, &config.extensions, db, &CancellationToken::new())?;

    let done = items.iter().filter(|i| i.is_done()).count();
    let shown = visible_items(&items, show_done, filter);
    for item in &shown {
        println!("{}", output::item_with_tags(item, quiet));
    }

    if !quiet {
        println!(
            "\nFound {} image(s) in {} ({done} done{})",
            items.len(),
            working.display(),
            if show_done { "" } else { ", hidden" }
        );
        if filter.is_some() {
            println!("{} matching the filter", shown.len());
        }
    }
    Ok(())
}

/// Items to list: done ones only with `show_done`, then the path filter
#[must_use]
pub fn visible_items<'a>(items: &'a [TaggedItem], show_done: bool, filter: Option<&str>) -> Vec<&'a TaggedItem> {
    items
        .iter()
        .filter(|i| show_done || !i.is_done())
        .filter(|i| filter.is_none_or(|f| i.matches_filter(f)))
        .collect()
}
