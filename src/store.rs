//! Tag store abstraction
//!
//! The publish engine only ever reads two things from wherever tags live:
//! the ordered list of tags, and the relative paths assigned to each one.
//! [`TagStore`] is that seam. The sled-backed [`crate::db::Database`] is the
//! persistent implementation; [`MemoryTagStore`] keeps everything in memory.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};

use crate::tags::{Tag, TagRegistry, normalize};

/// Read access to tags and their item assignments
pub trait TagStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All known tags, in the order publish should process them
    ///
    /// # Errors
    ///
    /// Returns the store's error if tags cannot be read.
    fn all_tags(&self) -> Result<Vec<Tag>, Self::Error>;

    /// Relative paths of the items carrying `tag`, in assignment order
    ///
    /// # Errors
    ///
    /// Returns the store's error if the assignments cannot be read.
    fn item_paths_for_tag(&self, tag: &Tag) -> Result<Vec<String>, Self::Error>;
}

impl<S: TagStore + ?Sized> TagStore for &S {
    type Error = S::Error;

    fn all_tags(&self) -> Result<Vec<Tag>, Self::Error> {
        (**self).all_tags()
    }

    fn item_paths_for_tag(&self, tag: &Tag) -> Result<Vec<String>, Self::Error> {
        (**self).item_paths_for_tag(tag)
    }
}

impl<S: TagStore + ?Sized> TagStore for Arc<S> {
    type Error = S::Error;

    fn all_tags(&self) -> Result<Vec<Tag>, Self::Error> {
        (**self).all_tags()
    }

    fn item_paths_for_tag(&self, tag: &Tag) -> Result<Vec<String>, Self::Error> {
        (**self).item_paths_for_tag(tag)
    }
}

/// In-memory tag store preserving tag creation order
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    registry: TagRegistry,
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    order: Vec<Tag>,
    items: HashMap<String, Vec<String>>,
}

impl MemoryTagStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `name` if unknown; returns the shared handle either way
    pub fn create_tag(&self, name: &str) -> Tag {
        let tag = self.registry.get_or_create(name);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.items.contains_key(tag.key()) {
            state.items.insert(tag.key().to_string(), Vec::new());
            state.order.push(tag.clone());
        }
        tag
    }

    /// Assign `tag_name` to the item at `path`, creating the tag if needed
    pub fn assign(&self, tag_name: &str, path: &str) -> Tag {
        let tag = self.create_tag(tag_name);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let items = state.items.entry(tag.key().to_string()).or_default();
        if !items.iter().any(|p| p == path) {
            items.push(path.to_string());
        }
        tag
    }

    /// `true` if the assignment existed
    pub fn unassign(&self, tag_name: &str, path: &str) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.items.get_mut(&normalize(tag_name)) {
            Some(items) => {
                let before = items.len();
                items.retain(|p| p != path);
                before != items.len()
            }
            None => false,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &TagRegistry {
        &self.registry
    }
}

impl TagStore for MemoryTagStore {
    type Error = Infallible;

    fn all_tags(&self) -> Result<Vec<Tag>, Self::Error> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.order.clone())
    }

    fn item_paths_for_tag(&self, tag: &Tag) -> Result<Vec<String>, Self::Error> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.items.get(tag.key()).cloned().unwrap_or_default())
    }
}
