//! Working folder scan
//!
//! Walks the working folder, keeps the image files, and registers each one in
//! the folder's database so its stored tags come back with it.

use std::path::{Component, Path};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::FanoutError;
use crate::db::{DB_DIR_NAME, Database};
use crate::engine::CancellationToken;
use crate::tags::TaggedItem;

type Result<T> = std::result::Result<T, FanoutError>;

/// Extensions picked up by a scan when none are configured
pub const DEFAULT_EXTENSIONS: [&str; 6] = ["jpeg", "jpg", "png", "gif", "webp", "bmp"];

/// Whether `path` ends in one of `extensions` (case-insensitive, leading dot optional)
#[must_use]
pub fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// `/`-separated form of `path` relative to `root`, if it is valid UTF-8
#[must_use]
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    parts.map(|p| p.join("/")).filter(|key| !key.is_empty())
}

/// Register every image below `working` and return them sorted by relative path
///
/// Unreadable subdirectories and non-UTF-8 names are logged and skipped.
///
/// # Errors
///
/// Returns `FanoutError::InvalidInput` if `working` is not a directory,
/// `FanoutError::Engine` with a cancellation if `cancel` fires, or a
/// database error.
pub fn scan_folder(
    working: &Path,
    extensions: &[String],
    db: &Database,
    cancel: &CancellationToken,
) -> Result<Vec<TaggedItem>> {
    if !working.is_dir() {
        return Err(FanoutError::InvalidInput(format!(
            "Not a directory: {}",
            working.display()
        )));
    }

    let walker = WalkDir::new(working)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != DB_DIR_NAME);

    let mut items = Vec::new();
    for entry in walker {
        cancel.check()?;
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_allowed_extension(entry.path(), extensions) {
            continue;
        }
        let Some(key) = relative_key(working, entry.path()) else {
            warn!(path = %entry.path().display(), "skipping non UTF-8 path");
            continue;
        };
        debug!(item = %key, "found");
        items.push(db.add_or_update_item(&key)?);
    }

    items.sort_by(|a, b| a.path().cmp(b.path()));
    info!(folder = %working.display(), items = items.len(), "scan complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDb;

    fn defaults() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_extension_filter() {
        let exts = defaults();
        assert!(has_allowed_extension(Path::new("a.jpg"), &exts));
        assert!(has_allowed_extension(Path::new("dir/B.JPEG"), &exts));
        assert!(has_allowed_extension(Path::new("c.WebP"), &exts));
        assert!(!has_allowed_extension(Path::new("notes.txt"), &exts));
        assert!(!has_allowed_extension(Path::new("jpg"), &exts));
        assert!(has_allowed_extension(Path::new("x.tiff"), &[".tiff".to_string()]));
    }

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let root = Path::new("/work");
        assert_eq!(
            relative_key(root, &root.join("2023").join("a.jpg")).as_deref(),
            Some("2023/a.jpg")
        );
        assert_eq!(relative_key(root, root), None);
        assert_eq!(relative_key(root, Path::new("/elsewhere/a.jpg")), None);
    }

    #[test]
    fn test_scan_registers_images_only() {
        let test_db = TestDb::new();
        let tree = test_db.tree();
        tree.file("b.png", b"b");
        tree.file("2023/a.JPG", b"a");
        tree.file("2023/readme.txt", b"text");
        tree.file("deep/er/c.gif", b"c");

        let items = scan_folder(tree.path(), &defaults(), test_db.db(), &CancellationToken::new()).unwrap();
        let paths: Vec<&str> = items.iter().map(TaggedItem::path).collect();

        assert_eq!(paths, vec!["2023/a.JPG", "b.png", "deep/er/c.gif"]);
        assert_eq!(test_db.db().count_items(), 3);
    }

    #[test]
    fn test_scan_skips_database_directory() {
        let test_db = TestDb::new();
        let tree = test_db.tree();
        tree.file("a.jpg", b"a");
        tree.file(format!("{DB_DIR_NAME}/decoy.jpg"), b"x");

        let items = scan_folder(tree.path(), &defaults(), test_db.db(), &CancellationToken::new()).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_rescan_keeps_tags() {
        let test_db = TestDb::new();
        let db = test_db.db();
        test_db.tree().file("a.jpg", b"a");

        scan_folder(test_db.tree().path(), &defaults(), db, &CancellationToken::new()).unwrap();
        db.create_tag("kept").unwrap();
        db.add_tag_to_item("a.jpg", "kept").unwrap();

        let items = scan_folder(test_db.tree().path(), &defaults(), db, &CancellationToken::new()).unwrap();
        assert_eq!(items[0].tags()[0].name(), "kept");
    }

    #[test]
    fn test_scan_missing_folder() {
        let test_db = TestDb::new();
        let missing = test_db.tree().path().join("nope");
        let result = scan_folder(&missing, &defaults(), test_db.db(), &CancellationToken::new());
        assert!(matches!(result, Err(FanoutError::InvalidInput(_))));
    }

    #[test]
    fn test_scan_cancelled() {
        let test_db = TestDb::new();
        test_db.tree().file("a.jpg", b"a");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = scan_folder(test_db.tree().path(), &defaults(), test_db.db(), &cancel);
        assert!(matches!(result, Err(FanoutError::Engine(e)) if e.is_cancelled()));
        assert_eq!(test_db.db().count_items(), 0);
    }
}
