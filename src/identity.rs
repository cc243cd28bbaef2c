//! Recognizing previously seen content
//!
//! When an item is looked at, its fingerprint is computed and stored. If some
//! other item in the folder has the same bytes, the tags already given to
//! that content are carried over, unless the item was marked done.

use std::path::Path;

use tracing::{debug, info};

use crate::FanoutError;
use crate::db::{Database, DbError};
use crate::engine::{CancellationToken, ContentHasher};
use crate::tags::{Tag, TaggedItem};

type Result<T> = std::result::Result<T, FanoutError>;

/// Result of [`recall_tags`]
#[derive(Debug, Clone)]
pub struct Recall {
    pub hash: String,
    /// Tags newly assigned from identical items
    pub added: Vec<Tag>,
    /// The item as stored afterwards
    pub item: TaggedItem,
}

/// Fingerprint `item` and pull in the tags of identical items
///
/// # Errors
///
/// Returns an engine error if the file cannot be hashed (or hashing is
/// cancelled) and a database error if the item is unknown or a write fails.
pub fn recall_tags(
    working: &Path,
    item: &TaggedItem,
    db: &Database,
    hasher: &ContentHasher,
    cancel: &CancellationToken,
) -> Result<Recall> {
    let path = item.path();
    let hash = hasher.compute_hash(working.join(path), cancel)?;
    db.set_hash(path, &hash)?;

    let stored = db
        .get_item(path)?
        .ok_or_else(|| DbError::ItemNotFound(path.to_string()))?;

    let mut added = Vec::new();
    if stored.is_done() {
        debug!(item = %path, "done, not recalling tags");
    } else {
        for tag in db.tags_for_hash(&hash)? {
            if !stored.has(&tag) && db.add_tag_to_item(path, tag.name())? {
                added.push(tag);
            }
        }
    }

    if !added.is_empty() {
        info!(item = %path, added = added.len(), "recalled tags from identical content");
    }

    let item = db
        .get_item(path)?
        .ok_or_else(|| DbError::ItemNotFound(path.to_string()))?;
    Ok(Recall { hash, added, item })
}
