//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI args
//! and executes the operation against the working folder's database.

pub mod config;
pub mod hash;
pub mod publish;
pub mod scan;
pub mod tag;
pub mod tags;
pub mod target;

// Re-export execute functions for convenience
pub use config::execute as config;
pub use hash::execute as hash;
pub use publish::execute as publish;
pub use scan::execute as scan;
pub use tag::execute as tag;
pub use tags::execute as tags;
pub use target::execute as target;

use std::path::{Path, PathBuf};

use crate::FanoutError;
use crate::db::Database;
use crate::scan::relative_key;
use crate::tags::TaggedItem;

type Result<T> = std::result::Result<T, FanoutError>;

/// Turn a FILE argument into the item key used by the database
///
/// Relative arguments are tried against the current directory first, then
/// against the working folder.
///
/// # Errors
///
/// Returns `FanoutError::InvalidInput` if the file cannot be found or lies
/// outside the working folder.
pub fn item_key(working: &Path, file: &Path) -> Result<String> {
    let candidate: PathBuf = if file.is_absolute() || file.exists() {
        file.to_path_buf()
    } else {
        working.join(file)
    };
    let full = candidate.canonicalize().map_err(|e| {
        FanoutError::InvalidInput(format!("Cannot access path '{}': {e}", file.display()))
    })?;
    if !full.is_file() {
        return Err(FanoutError::InvalidInput(format!(
            "Not a file: {}",
            file.display()
        )));
    }
    relative_key(working, &full).ok_or_else(|| {
        FanoutError::InvalidInput(format!(
            "{} is not inside the working folder {}",
            file.display(),
            working.display()
        ))
    })
}

/// Resolve FILE and make sure the database knows it
///
/// # Errors
///
/// Returns `FanoutError::InvalidInput` for a bad path or a database error.
pub fn registered_item(db: &Database, working: &Path, file: &Path) -> Result<TaggedItem> {
    let key = item_key(working, file)?;
    Ok(db.add_or_update_item(&key)?)
}
