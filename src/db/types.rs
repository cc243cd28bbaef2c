//! Stored record types
//!
//! Values kept in the sled trees, encoded with bincode.
//!
//! # Types
//!
//! - **`ItemRecord`**: value of the `items` tree (relative path → tags, done, hash)
//! - **`TagRecord`**: value of the `tags` tree (normalized name → display name, items)
//! - **`PathList`**: value of the `hashes` tree (hash → relative paths)
//!
//! Keys are plain UTF-8 bytes: relative paths, normalized tag names, hex hashes.

use bincode::{Decode, Encode};

use super::error::DbError;

/// Tagging state of one file
#[derive(Encode, Decode, Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemRecord {
    /// Display names, in assignment order
    pub tags: Vec<String>,
    pub done: bool,
    pub hash: Option<String>,
}

impl ItemRecord {
    /// Whether `key` (a normalized tag name) is assigned
    #[must_use]
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.iter().any(|t| crate::tags::normalize(t) == key)
    }

    /// `true` if a tag was removed
    pub fn remove_tag(&mut self, key: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| crate::tags::normalize(t) != key);
        before != self.tags.len()
    }
}

/// A tag and the items carrying it
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq)]
pub struct TagRecord {
    /// Display spelling given at creation
    pub name: String,
    /// Relative paths, in assignment order
    pub items: Vec<String>,
}

impl TagRecord {
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self {
            name,
            items: Vec::new(),
        }
    }
}

/// Ordered, duplicate-free list of relative paths
#[derive(Encode, Decode, Clone, Debug, Default, PartialEq, Eq)]
pub struct PathList(pub Vec<String>);

impl PathList {
    /// `true` if added
    pub fn insert(&mut self, path: &str) -> bool {
        if self.0.iter().any(|p| p == path) {
            return false;
        }
        self.0.push(path.to_string());
        true
    }

    /// `true` if removed
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|p| p != path);
        before != self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Encode a record with the standard bincode configuration
///
/// # Errors
///
/// Returns `DbError::Encode` if encoding fails.
pub fn encode<T: Encode>(value: &T) -> Result<Vec<u8>, DbError> {
    Ok(bincode::encode_to_vec(value, bincode::config::standard())?)
}

/// Decode a record with the standard bincode configuration
///
/// # Errors
///
/// Returns `DbError::Decode` if the bytes are not a valid `T`.
pub fn decode<T: Decode<()>>(bytes: &[u8]) -> Result<T, DbError> {
    let (value, _): (T, usize) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

/// Interpret a tree key as UTF-8
///
/// # Errors
///
/// Returns `DbError::InvalidKey` on invalid UTF-8.
pub fn key_to_string(key: &[u8]) -> Result<String, DbError> {
    String::from_utf8(key.to_vec()).map_err(|_| DbError::InvalidKey("Invalid UTF-8 in key".into()))
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
