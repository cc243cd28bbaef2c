//! Testing utilities for fanout
//!
//! This module provides helper types for writing tests: a `TestTree` for
//! building throwaway folder trees and a `TestDb` wrapper pairing one with an
//! open database.
//!
//! Only available when compiled with `cfg(test)`.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::db::Database;

/// Temporary directory tree, removed on drop
///
/// # Examples
/// ```ignore
/// let tree = TestTree::new();
/// tree.file("2023/a.jpg", b"pixels");
/// assert_eq!(tree.read("2023/a.jpg"), b"pixels");
/// ```
pub struct TestTree {
    dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// # Panics
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `relative`, creating parent directories
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn file(&self, relative: impl AsRef<Path>, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// # Panics
    /// Panics if the directory cannot be created.
    pub fn dir(&self, relative: impl AsRef<Path>) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(&path).expect("Failed to create test dir");
        path
    }

    /// # Panics
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, relative: impl AsRef<Path>) -> Vec<u8> {
        fs::read(self.dir.path().join(relative)).expect("Failed to read test file")
    }

    /// Regular files anywhere below the root
    #[must_use]
    pub fn count_files(&self) -> usize {
        WalkDir::new(self.dir.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .count()
    }
}

/// A working folder with its database open
///
/// The database lives in the folder's `.fanout-db`, exactly where the CLI
/// puts it; everything is removed when the wrapper goes out of scope.
pub struct TestDb {
    db: Database,
    tree: TestTree,
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDb {
    /// # Panics
    /// Panics if the database cannot be opened.
    #[must_use]
    pub fn new() -> Self {
        let tree = TestTree::new();
        let db = Database::open_in(tree.path()).expect("Failed to open test database");
        Self { db, tree }
    }

    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }

    /// The working folder
    #[must_use]
    pub const fn tree(&self) -> &TestTree {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_writes_nested_files() {
        let tree = TestTree::new();
        let path = tree.file("a/b/c.txt", b"deep");
        assert!(path.is_file());
        assert_eq!(tree.read("a/b/c.txt"), b"deep");
        assert_eq!(tree.count_files(), 1);
    }

    #[test]
    fn test_tree_cleanup() {
        let root = {
            let tree = TestTree::new();
            tree.file("x.txt", b"x");
            tree.path().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_db_lives_in_working_folder() {
        let test_db = TestDb::new();
        assert!(test_db.tree().path().join(crate::db::DB_DIR_NAME).exists());
        assert_eq!(test_db.db().count_items(), 0);
    }
}
