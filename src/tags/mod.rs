//! Tags and tag identity
//!
//! A [`Tag`] is a cheap, cloneable handle around a case-insensitive name.
//! A [`TagRegistry`] hands out one shared handle per normalized name, so
//! "Cat" and "cat" resolve to the same instance for as long as one working
//! folder stays open. There is no process-wide cache: each opened store owns
//! its registry.

pub mod item;

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

pub use item::TaggedItem;

/// Normalized key for a tag name (trimmed, lowercased)
#[must_use]
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check that a trimmed tag name can be used as a single folder name
///
/// # Errors
///
/// Returns the offending name when it is empty, `.`/`..`, or contains a path
/// separator or NUL.
pub fn validate_tag_name(name: &str) -> Result<&str, String> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\', '\0']);
    if invalid {
        Err(name.to_string())
    } else {
        Ok(trimmed)
    }
}

#[derive(Debug)]
struct TagInner {
    name: String,
    key: String,
}

/// Case-insensitive tag handle
///
/// Equality and hashing use the normalized name; [`Tag::name`] keeps the
/// display spelling of whoever created it first.
#[derive(Clone)]
pub struct Tag(Arc<TagInner>);

impl Tag {
    /// Standalone tag, not shared through any registry
    #[must_use]
    pub fn new(name: &str) -> Self {
        let name = name.trim().to_string();
        let key = normalize(&name);
        Self(Arc::new(TagInner { name, key }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Normalized (lowercase) name used for comparisons and storage keys
    #[must_use]
    pub fn key(&self) -> &str {
        &self.0.key
    }

    /// Whether `name` designates this tag
    #[must_use]
    pub fn same(&self, name: &str) -> bool {
        normalize(name) == self.0.key
    }

    /// Case-insensitive substring match used for tag filtering
    #[must_use]
    pub fn matches_filter(&self, filter: &str) -> bool {
        self.0.key.contains(&normalize(filter))
    }

    /// Whether both handles point to the very same registry entry
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.0.key == other.0.key
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.key.cmp(&other.0.key)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tag").field(&self.0.name).finish()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Identity map from normalized name to shared tag handle
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: Mutex<HashMap<String, Tag>>,
}

impl TagRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registered handle for `name`, creating it on first use
    pub fn get_or_create(&self, name: &str) -> Tag {
        let mut tags = self.tags.lock().unwrap_or_else(PoisonError::into_inner);
        tags.entry(normalize(name))
            .or_insert_with(|| Tag::new(name))
            .clone()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Tag> {
        let tags = self.tags.lock().unwrap_or_else(PoisonError::into_inner);
        tags.get(&normalize(name)).cloned()
    }

    pub fn remove(&self, tag: &Tag) -> Option<Tag> {
        let mut tags = self.tags.lock().unwrap_or_else(PoisonError::into_inner);
        tags.remove(tag.key())
    }

    pub fn clear(&self) {
        self.tags.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
