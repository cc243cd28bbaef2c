//! Target command - show or set the folder's publish target

use std::path::{Component, Path, PathBuf};

use crate::FanoutError;
use crate::db::{Database, PARAM_TARGET_FOLDER};

type Result<T> = std::result::Result<T, FanoutError>;

/// Execute the target command
///
/// # Errors
/// Returns an error if the current directory cannot be read or database operations fail
pub fn execute(db: &Database, path: Option<&Path>, quiet: bool) -> Result<()> {
    match path {
        Some(path) => {
            let target = save_target(db, path)?;
            if !quiet {
                println!("Publish target set to {}", target.display());
            }
        }
        None => match db.get_parameter(PARAM_TARGET_FOLDER)? {
            Some(target) => println!("{target}"),
            None => {
                if !quiet {
                    println!("No publish target set. Use 'fanout target <PATH>' to set one.");
                }
            }
        },
    }
    Ok(())
}

/// Absolute form of `path` with `.`, `..` and symlinks resolved
///
/// The longest existing prefix is canonicalized; the components below it,
/// which do not exist yet, are appended lexically.
///
/// # Errors
/// Returns an error if the current directory cannot be read or the existing
/// prefix cannot be canonicalized
pub fn normalize_target(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut base = absolute.as_path();
    let mut rest = Vec::new();
    while !base.exists() {
        let (Some(parent), Some(last)) = (base.parent(), base.components().next_back()) else {
            break;
        };
        rest.push(last.as_os_str().to_os_string());
        base = parent;
    }

    let mut normalized = base.canonicalize()?;
    for name in rest.iter().rev() {
        match Path::new(name).components().next() {
            Some(Component::ParentDir) => {
                normalized.pop();
            }
            Some(Component::CurDir) | None => {}
            Some(_) => normalized.push(name),
        }
    }
    Ok(normalized)
}

/// Refuse a target that contains, or lies inside, the working folder
///
/// Both paths are expected in normalized form.
///
/// # Errors
/// Returns `FanoutError::InvalidInput` when the two folders overlap
pub fn check_target(working: &Path, target: &Path) -> Result<()> {
    if target.starts_with(working) {
        return Err(FanoutError::InvalidInput(format!(
            "Target {} is inside the working folder",
            target.display()
        )));
    }
    if working.starts_with(target) {
        return Err(FanoutError::InvalidInput(format!(
            "Target {} contains the working folder {}",
            target.display(),
            working.display()
        )));
    }
    Ok(())
}

/// Store `path`, normalized, as the folder's target
///
/// # Errors
/// Returns an error if the path is not valid UTF-8, cannot be normalized, or
/// the database write fails
pub fn save_target(db: &Database, path: &Path) -> Result<PathBuf> {
    let target = normalize_target(path)?;
    let text = target.to_str().ok_or_else(|| {
        FanoutError::InvalidInput(format!("Target path is not valid UTF-8: {}", target.display()))
    })?;
    db.set_parameter(PARAM_TARGET_FOLDER, text)?;
    Ok(target)
}

/// The stored target, if any
///
/// # Errors
/// Returns an error if the database read fails
pub fn load_target(db: &Database) -> Result<Option<PathBuf>> {
    Ok(db.get_parameter(PARAM_TARGET_FOLDER)?.map(PathBuf::from))
}
