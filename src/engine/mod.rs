//! File-identity and publish-reconciliation engine
//!
//! The building blocks publish is made of, usable on their own:
//!
//! - [`ContentHasher`]: BLAKE3 fingerprint of a file, streamed and cancellable
//! - [`FileComparer`]: byte-exact comparison with a SIMD fast path
//! - [`DestinationNamer`]: collision-free destination names that never overwrite
//! - [`wipe`]: recursive, failure-tolerant emptying of a directory tree
//! - [`FileCopier`]: cancellable streaming copy preserving the last-write time
//!
//! Everything here polls a shared [`CancellationToken`] between units of work.

pub mod cancel;
pub mod compare;
pub mod copy;
pub mod error;
pub mod hash;
pub mod namer;
pub mod wipe;

pub use cancel::CancellationToken;
pub use compare::FileComparer;
pub use copy::FileCopier;
pub use error::EngineError;
pub use hash::ContentHasher;
pub use namer::{DEFAULT_MAX_COLLISION_SUFFIX, DestinationNamer, Resolution};
pub use wipe::{EntryKind, WipeOutcome, WipeStats, wipe};

/// Read size shared by hashing, comparison and copy (128 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024;
