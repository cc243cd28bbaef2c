//! Database wrapper module for fanout
//!
//! Persists the tagging state of one working folder using sled as the
//! embedded database backend. The database lives inside the working folder
//! (see [`DB_DIR_NAME`]), so a folder carries its tags with it.
//!
//! Uses multiple sled trees for efficient indexing:
//! - `items`: relative path → [`ItemRecord`] (tags, done flag, fingerprint)
//! - `tags`: normalized tag name → [`TagRecord`] (display name, items)
//! - `hashes`: fingerprint → [`PathList`] of items sharing that content
//! - `parameters`: per-folder settings such as the publish target

use sled::{Db, Tree};
use std::path::Path;

use crate::store::TagStore;
use crate::tags::{Tag, TagRegistry, TaggedItem, normalize, validate_tag_name};

pub mod error;
pub mod types;

pub use error::DbError;
pub use types::{ItemRecord, PathList, TagRecord};

use types::{decode, encode, key_to_string};

/// Name of the database directory inside a working folder
pub const DB_DIR_NAME: &str = ".fanout-db";

/// Parameter key for the folder's publish target
pub const PARAM_TARGET_FOLDER: &str = "target_folder";
/// Parameter key for whether done items are listed
pub const PARAM_SHOW_DONE: &str = "show_done";

/// Database wrapper that encapsulates all database operations
///
/// Tag handles returned from here come from the database's own
/// [`TagRegistry`], so two lookups of "Cat" and "cat" share one handle for
/// as long as the database stays open.
pub struct Database {
    db: Db,
    items: Tree,
    tags: Tree,
    hashes: Tree,
    parameters: Tree,
    registry: TagRegistry,
}

impl Database {
    /// Opens or creates a database at the specified path
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database cannot be opened or if the internal trees cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let db = sled::open(path)?;
        let items = db.open_tree("items")?;
        let tags = db.open_tree("tags")?;
        let hashes = db.open_tree("hashes")?;
        let parameters = db.open_tree("parameters")?;
        Ok(Self {
            db,
            items,
            tags,
            hashes,
            parameters,
            registry: TagRegistry::new(),
        })
    }

    /// Opens the database belonging to `working_folder`
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database cannot be opened.
    pub fn open_in<P: AsRef<Path>>(working_folder: P) -> Result<Self, DbError> {
        Self::open(working_folder.as_ref().join(DB_DIR_NAME))
    }

    /// The identity map all returned tags come from
    #[must_use]
    pub const fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Create a tag
    ///
    /// The name is trimmed. Returns `Ok(None)` if a tag with the same
    /// case-insensitive name already exists.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidTagName` if the name is empty or not usable as
    /// a folder name, or a storage error.
    pub fn create_tag(&self, name: &str) -> Result<Option<Tag>, DbError> {
        let name = validate_tag_name(name).map_err(DbError::InvalidTagName)?;
        let key = normalize(name);
        let record = encode(&TagRecord::new(name.to_string()))?;

        let inserted = self
            .tags
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(record))?;
        if inserted.is_err() {
            return Ok(None);
        }
        Ok(Some(self.registry.get_or_create(name)))
    }

    /// Look up a tag by case-insensitive name
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn get_tag(&self, name: &str) -> Result<Option<Tag>, DbError> {
        Ok(self
            .tag_record(&normalize(name))?
            .map(|record| self.registry.get_or_create(&record.name)))
    }

    /// Delete a tag and remove it from every item carrying it
    ///
    /// Returns `false` if no such tag exists.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn delete_tag(&self, name: &str) -> Result<bool, DbError> {
        let key = normalize(name);
        let Some(bytes) = self.tags.remove(key.as_bytes())? else {
            return Ok(false);
        };
        let record: TagRecord = decode(&bytes)?;

        for path in &record.items {
            if let Some(mut item) = self.item_record(path)? {
                item.remove_tag(&key);
                self.put_item(path, &item)?;
            }
        }
        if let Some(tag) = self.registry.get(&key) {
            self.registry.remove(&tag);
        }
        Ok(true)
    }

    /// All tags, sorted by normalized name
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn all_tags(&self) -> Result<Vec<Tag>, DbError> {
        self.tags
            .iter()
            .values()
            .map(|value| {
                let record: TagRecord = decode(&value?)?;
                Ok(self.registry.get_or_create(&record.name))
            })
            .collect()
    }

    /// Relative paths of the items carrying `tag`, in assignment order
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn item_paths_for_tag(&self, tag: &Tag) -> Result<Vec<String>, DbError> {
        Ok(self
            .tag_record(tag.key())?
            .map(|record| record.items)
            .unwrap_or_default())
    }

    /// Number of items carrying `tag`
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn tag_usage(&self, tag: &Tag) -> Result<usize, DbError> {
        Ok(self.item_paths_for_tag(tag)?.len())
    }

    /// Register `path`, returning its stored state
    ///
    /// Known items keep their tags, done flag and fingerprint; unknown ones
    /// are inserted untagged.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or serialization errors occur.
    pub fn add_or_update_item(&self, path: &str) -> Result<TaggedItem, DbError> {
        if let Some(record) = self.item_record(path)? {
            return Ok(self.to_item(path, record));
        }
        let record = ItemRecord::default();
        self.put_item(path, &record)?;
        Ok(self.to_item(path, record))
    }

    /// Get a stored item
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn get_item(&self, path: &str) -> Result<Option<TaggedItem>, DbError> {
        Ok(self.item_record(path)?.map(|record| self.to_item(path, record)))
    }

    /// All stored items, sorted by relative path
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn list_items(&self) -> Result<Vec<TaggedItem>, DbError> {
        self.items
            .iter()
            .map(|entry| {
                let (key, value) = entry?;
                let path = key_to_string(&key)?;
                let record: ItemRecord = decode(&value)?;
                Ok(self.to_item(&path, record))
            })
            .collect()
    }

    /// Count of stored items
    #[must_use]
    pub fn count_items(&self) -> usize {
        self.items.len()
    }

    /// Assign a tag to an item
    ///
    /// Returns `false` if the item already had it.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ItemNotFound` / `DbError::TagNotFound` for unknown
    /// entries, or a storage error.
    pub fn add_tag_to_item(&self, path: &str, tag_name: &str) -> Result<bool, DbError> {
        let key = normalize(tag_name);
        let mut item = self.require_item(path)?;
        let mut tag = self.require_tag(&key, tag_name)?;

        if item.has_tag(&key) {
            return Ok(false);
        }
        item.tags.push(tag.name.clone());
        tag.items.push(path.to_string());
        self.put_item(path, &item)?;
        self.tags.insert(key.as_bytes(), encode(&tag)?)?;
        Ok(true)
    }

    /// Remove a tag from an item
    ///
    /// Returns `false` if the item did not have it.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ItemNotFound` / `DbError::TagNotFound` for unknown
    /// entries, or a storage error.
    pub fn remove_tag_from_item(&self, path: &str, tag_name: &str) -> Result<bool, DbError> {
        let key = normalize(tag_name);
        let mut item = self.require_item(path)?;
        let mut tag = self.require_tag(&key, tag_name)?;

        if !item.remove_tag(&key) {
            return Ok(false);
        }
        tag.items.retain(|p| p != path);
        self.put_item(path, &item)?;
        self.tags.insert(key.as_bytes(), encode(&tag)?)?;
        Ok(true)
    }

    /// Flip a tag on an item; returns whether the item now carries it
    ///
    /// # Errors
    ///
    /// Returns `DbError::ItemNotFound` / `DbError::TagNotFound` for unknown
    /// entries, or a storage error.
    pub fn toggle_tag(&self, path: &str, tag_name: &str) -> Result<bool, DbError> {
        if self.remove_tag_from_item(path, tag_name)? {
            Ok(false)
        } else {
            self.add_tag_to_item(path, tag_name)
        }
    }

    /// Set the done flag of an item
    ///
    /// # Errors
    ///
    /// Returns `DbError::ItemNotFound` if the item is unknown, or a storage error.
    pub fn mark_done(&self, path: &str, done: bool) -> Result<(), DbError> {
        let mut item = self.require_item(path)?;
        item.done = done;
        self.put_item(path, &item)
    }

    /// Store the fingerprint of an item and index it
    ///
    /// # Errors
    ///
    /// Returns `DbError::ItemNotFound` if the item is unknown, or a storage error.
    pub fn set_hash(&self, path: &str, hash: &str) -> Result<(), DbError> {
        let mut item = self.require_item(path)?;
        if item.hash.as_deref() == Some(hash) {
            return Ok(());
        }
        if let Some(old) = item.hash.take() {
            let mut paths = self.hash_paths(&old)?;
            paths.remove(path);
            if paths.is_empty() {
                self.hashes.remove(old.as_bytes())?;
            } else {
                self.hashes.insert(old.as_bytes(), encode(&paths)?)?;
            }
        }

        let mut paths = self.hash_paths(hash)?;
        paths.insert(path);
        self.hashes.insert(hash.as_bytes(), encode(&paths)?)?;

        item.hash = Some(hash.to_string());
        self.put_item(path, &item)
    }

    /// Items whose content has fingerprint `hash`, in indexing order
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn items_with_hash(&self, hash: &str) -> Result<Vec<String>, DbError> {
        Ok(self.hash_paths(hash)?.0)
    }

    /// Union of the tags of every item with fingerprint `hash`
    ///
    /// Ordered by item indexing order, then by assignment order.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or deserialization errors occur.
    pub fn tags_for_hash(&self, hash: &str) -> Result<Vec<Tag>, DbError> {
        let mut tags: Vec<Tag> = Vec::new();
        for path in self.hash_paths(hash)?.0 {
            let Some(record) = self.item_record(&path)? else {
                continue;
            };
            for name in &record.tags {
                let tag = self.registry.get_or_create(name);
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        Ok(tags)
    }

    /// Read a per-folder parameter
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail or the value is not UTF-8.
    pub fn get_parameter(&self, key: &str) -> Result<Option<String>, DbError> {
        self.parameters
            .get(key.as_bytes())?
            .map(|value| key_to_string(&value))
            .transpose()
    }

    /// Write a per-folder parameter
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database write fails.
    pub fn set_parameter(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.parameters.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    /// Flush all pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), DbError> {
        self.db.flush()?;
        Ok(())
    }

    /// Clear all data from the database (all trees)
    ///
    /// # Errors
    ///
    /// Returns `DbError` if clearing any tree fails.
    pub fn clear(&self) -> Result<(), DbError> {
        self.items.clear()?;
        self.tags.clear()?;
        self.hashes.clear()?;
        self.parameters.clear()?;
        self.registry.clear();
        Ok(())
    }

    fn item_record(&self, path: &str) -> Result<Option<ItemRecord>, DbError> {
        self.items
            .get(path.as_bytes())?
            .map(|value| decode(&value))
            .transpose()
    }

    fn require_item(&self, path: &str) -> Result<ItemRecord, DbError> {
        self.item_record(path)?
            .ok_or_else(|| DbError::ItemNotFound(path.to_string()))
    }

    fn put_item(&self, path: &str, record: &ItemRecord) -> Result<(), DbError> {
        self.items.insert(path.as_bytes(), encode(record)?)?;
        Ok(())
    }

    fn tag_record(&self, key: &str) -> Result<Option<TagRecord>, DbError> {
        self.tags
            .get(key.as_bytes())?
            .map(|value| decode(&value))
            .transpose()
    }

    fn require_tag(&self, key: &str, name: &str) -> Result<TagRecord, DbError> {
        self.tag_record(key)?
            .ok_or_else(|| DbError::TagNotFound(name.trim().to_string()))
    }

    fn hash_paths(&self, hash: &str) -> Result<PathList, DbError> {
        Ok(self
            .hashes
            .get(hash.as_bytes())?
            .map(|value| decode(&value))
            .transpose()?
            .unwrap_or_default())
    }

    fn to_item(&self, path: &str, record: ItemRecord) -> TaggedItem {
        let mut item = TaggedItem::new(path);
        for name in &record.tags {
            item.add_tag(self.registry.get_or_create(name));
        }
        item.set_done(record.done);
        if let Some(hash) = record.hash {
            item.set_hash(hash);
        }
        item
    }
}

impl TagStore for Database {
    type Error = DbError;

    fn all_tags(&self) -> Result<Vec<Tag>, Self::Error> {
        Self::all_tags(self)
    }

    fn item_paths_for_tag(&self, tag: &Tag) -> Result<Vec<String>, Self::Error> {
        Self::item_paths_for_tag(self, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDb;

    fn names(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(Tag::name).collect()
    }

    #[test]
    fn test_create_tag_trims_and_rejects_duplicates() {
        let test_db = TestDb::new();
        let db = test_db.db();

        let cat = db.create_tag("  Cat ").unwrap().unwrap();
        assert_eq!(cat.name(), "Cat");
        assert!(db.create_tag("cat").unwrap().is_none());
        assert!(db.create_tag("CAT").unwrap().is_none());
        assert_eq!(db.all_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_create_tag_rejects_invalid_names() {
        let test_db = TestDb::new();
        let db = test_db.db();

        for bad in ["", "   ", "a/b", "a\\b", ".", ".."] {
            assert!(
                matches!(db.create_tag(bad), Err(DbError::InvalidTagName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_all_tags_sorted_case_insensitively() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("zebra").unwrap();
        db.create_tag("Apple").unwrap();
        db.create_tag("mango").unwrap();

        assert_eq!(names(&db.all_tags().unwrap()), vec!["Apple", "mango", "zebra"]);
    }

    #[test]
    fn test_tag_handles_are_shared() {
        let test_db = TestDb::new();
        let db = test_db.db();
        let created = db.create_tag("Cat").unwrap().unwrap();
        let looked_up = db.get_tag("cAt").unwrap().unwrap();
        assert!(created.ptr_eq(&looked_up));
        assert!(db.all_tags().unwrap()[0].ptr_eq(&created));
    }

    #[test]
    fn test_add_or_update_item_keeps_state() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("cat").unwrap();

        let item = db.add_or_update_item("2023/a.jpg").unwrap();
        assert!(item.tags().is_empty());
        assert!(!item.is_done());

        db.add_tag_to_item("2023/a.jpg", "cat").unwrap();
        db.mark_done("2023/a.jpg", true).unwrap();

        let again = db.add_or_update_item("2023/a.jpg").unwrap();
        assert_eq!(names(again.tags()), vec!["cat"]);
        assert!(again.is_done());
        assert_eq!(db.count_items(), 1);
    }

    #[test]
    fn test_assignment_order_is_preserved() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("b").unwrap();
        db.create_tag("a").unwrap();
        db.add_or_update_item("x.jpg").unwrap();
        db.add_or_update_item("y.jpg").unwrap();

        db.add_tag_to_item("x.jpg", "b").unwrap();
        db.add_tag_to_item("x.jpg", "a").unwrap();
        db.add_tag_to_item("y.jpg", "a").unwrap();

        let item = db.get_item("x.jpg").unwrap().unwrap();
        assert_eq!(names(item.tags()), vec!["b", "a"]);

        let a = db.get_tag("a").unwrap().unwrap();
        assert_eq!(db.item_paths_for_tag(&a).unwrap(), vec!["x.jpg", "y.jpg"]);
    }

    #[test]
    fn test_add_tag_is_idempotent() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("cat").unwrap();
        db.add_or_update_item("a.jpg").unwrap();

        assert!(db.add_tag_to_item("a.jpg", "Cat").unwrap());
        assert!(!db.add_tag_to_item("a.jpg", "cat").unwrap());
        let cat = db.get_tag("cat").unwrap().unwrap();
        assert_eq!(db.tag_usage(&cat).unwrap(), 1);
    }

    #[test]
    fn test_unknown_item_or_tag() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("cat").unwrap();
        db.add_or_update_item("a.jpg").unwrap();

        assert!(matches!(
            db.add_tag_to_item("missing.jpg", "cat"),
            Err(DbError::ItemNotFound(_))
        ));
        assert!(matches!(
            db.add_tag_to_item("a.jpg", "dog"),
            Err(DbError::TagNotFound(_))
        ));
        assert!(matches!(db.mark_done("missing.jpg", true), Err(DbError::ItemNotFound(_))));
    }

    #[test]
    fn test_toggle_tag() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("cat").unwrap();
        db.add_or_update_item("a.jpg").unwrap();

        assert!(db.toggle_tag("a.jpg", "cat").unwrap());
        assert!(!db.toggle_tag("a.jpg", "cat").unwrap());
        assert!(db.get_item("a.jpg").unwrap().unwrap().tags().is_empty());
        let cat = db.get_tag("cat").unwrap().unwrap();
        assert!(db.item_paths_for_tag(&cat).unwrap().is_empty());
    }

    #[test]
    fn test_delete_tag_removes_assignments() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("cat").unwrap();
        db.create_tag("dog").unwrap();
        db.add_or_update_item("a.jpg").unwrap();
        db.add_tag_to_item("a.jpg", "cat").unwrap();
        db.add_tag_to_item("a.jpg", "dog").unwrap();

        assert!(db.delete_tag("CAT").unwrap());
        assert!(!db.delete_tag("cat").unwrap());

        let item = db.get_item("a.jpg").unwrap().unwrap();
        assert_eq!(names(item.tags()), vec!["dog"]);
        assert_eq!(names(&db.all_tags().unwrap()), vec!["dog"]);
        assert!(db.registry().get("cat").is_none());
    }

    #[test]
    fn test_hash_index() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("cat").unwrap();
        db.create_tag("sofa").unwrap();
        for path in ["a.jpg", "b.jpg", "c.jpg"] {
            db.add_or_update_item(path).unwrap();
        }
        db.add_tag_to_item("a.jpg", "cat").unwrap();
        db.add_tag_to_item("b.jpg", "sofa").unwrap();
        db.add_tag_to_item("b.jpg", "cat").unwrap();

        db.set_hash("a.jpg", "h1").unwrap();
        db.set_hash("b.jpg", "h1").unwrap();
        db.set_hash("c.jpg", "h2").unwrap();

        assert_eq!(db.items_with_hash("h1").unwrap(), vec!["a.jpg", "b.jpg"]);
        assert_eq!(names(&db.tags_for_hash("h1").unwrap()), vec!["cat", "sofa"]);
        assert!(db.tags_for_hash("h2").unwrap().is_empty());
        assert!(db.tags_for_hash("nope").unwrap().is_empty());
    }

    #[test]
    fn test_rehash_moves_index_entry() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.add_or_update_item("a.jpg").unwrap();

        db.set_hash("a.jpg", "old").unwrap();
        db.set_hash("a.jpg", "new").unwrap();

        assert!(db.items_with_hash("old").unwrap().is_empty());
        assert_eq!(db.items_with_hash("new").unwrap(), vec!["a.jpg"]);
        assert_eq!(db.get_item("a.jpg").unwrap().unwrap().hash(), Some("new"));
    }

    #[test]
    fn test_parameters() {
        let test_db = TestDb::new();
        let db = test_db.db();
        assert_eq!(db.get_parameter(PARAM_TARGET_FOLDER).unwrap(), None);
        db.set_parameter(PARAM_TARGET_FOLDER, "/srv/out").unwrap();
        assert_eq!(
            db.get_parameter(PARAM_TARGET_FOLDER).unwrap().as_deref(),
            Some("/srv/out")
        );
    }

    #[test]
    fn test_list_items_sorted() {
        let test_db = TestDb::new();
        let db = test_db.db();
        for path in ["b.jpg", "a/z.png", "a.jpg"] {
            db.add_or_update_item(path).unwrap();
        }
        let paths: Vec<String> = db
            .list_items()
            .unwrap()
            .iter()
            .map(|i| i.path().to_string())
            .collect();
        assert_eq!(paths, vec!["a.jpg", "a/z.png", "b.jpg"]);
    }

    #[test]
    fn test_clear() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("cat").unwrap();
        db.add_or_update_item("a.jpg").unwrap();
        db.set_parameter(PARAM_SHOW_DONE, "true").unwrap();

        db.clear().unwrap();

        assert_eq!(db.count_items(), 0);
        assert!(db.all_tags().unwrap().is_empty());
        assert_eq!(db.get_parameter(PARAM_SHOW_DONE).unwrap(), None);
        assert!(db.registry().is_empty());
    }

    #[test]
    fn test_reopen_existing_database() {
        let tree = crate::testing::TestTree::new();
        {
            let db = Database::open_in(tree.path()).unwrap();
            db.create_tag("Saved").unwrap();
            db.add_or_update_item("p.jpg").unwrap();
            db.add_tag_to_item("p.jpg", "saved").unwrap();
            db.flush().unwrap();
        }

        let db = Database::open_in(tree.path()).unwrap();
        let item = db.get_item("p.jpg").unwrap().unwrap();
        assert_eq!(names(item.tags()), vec!["Saved"]);
    }

    #[test]
    fn test_database_as_tag_store() {
        let test_db = TestDb::new();
        let db = test_db.db();
        db.create_tag("t").unwrap();
        db.add_or_update_item("a.jpg").unwrap();
        db.add_tag_to_item("a.jpg", "t").unwrap();

        let store: &dyn TagStore<Error = DbError> = db;
        let tags = store.all_tags().unwrap();
        assert_eq!(store.item_paths_for_tag(&tags[0]).unwrap(), vec!["a.jpg"]);
    }
}
