//! Tracked image files
//!
//! A `TaggedItem` is a file identified by its path relative to the working
//! folder, with an ordered set of tags, a `done` flag and an optional content
//! fingerprint computed lazily.

use serde::Serialize;

use super::Tag;

/// A file in the working folder and its tagging state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedItem {
    path: String,
    tags: Vec<Tag>,
    done: bool,
    hash: Option<String>,
}

impl TaggedItem {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tags: Vec::new(),
            done: false,
            hash: None,
        }
    }

    /// Relative path inside the working folder
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Case-insensitive substring match on the path; a blank filter matches
    #[must_use]
    pub fn matches_filter(&self, filter: &str) -> bool {
        let filter = filter.trim();
        filter.is_empty() || self.path.to_lowercase().contains(&filter.to_lowercase())
    }

    /// Assigned tags, in assignment order
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    #[must_use]
    pub fn has(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Append `tag` unless already present; `true` if added
    pub fn add_tag(&mut self, tag: Tag) -> bool {
        if self.has(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// `true` if the tag was present
    pub fn remove_tag(&mut self, tag: &Tag) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        before != self.tags.len()
    }

    /// Add or remove `tag`; returns whether it is now assigned
    pub fn toggle(&mut self, tag: Tag) -> bool {
        if self.remove_tag(&tag) {
            false
        } else {
            self.tags.push(tag);
            true
        }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    pub const fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn set_hash(&mut self, hash: impl Into<String>) {
        self.hash = Some(hash.into());
    }

    /// Plain view for JSON output
    #[must_use]
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            path: self.path.clone(),
            tags: self.tags.iter().map(|t| t.name().to_string()).collect(),
            done: self.done,
            hash: self.hash.clone(),
        }
    }
}

/// Serializable snapshot of a [`TaggedItem`]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemSummary {
    pub path: String,
    pub tags: Vec<String>,
    pub done: bool,
    pub hash: Option<String>,
}
