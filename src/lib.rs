//! Fanout - tag image files and publish tagged subsets into per-tag folders
//!
//! This library provides the pieces of a tag-and-publish workflow:
//!
//! - [`engine`]: content hashing, byte-exact comparison, collision-free
//!   naming, recursive wipe and cancellable copy
//! - [`publish`]: the orchestrator that fans a tagged working set out into
//!   `target/<tag>/<file>`, plus a background job and a readable trail log
//! - [`db`]: the per-folder sled database holding tags, items and fingerprints
//! - [`scan`] and [`identity`]: discovering images and recognizing content
//!   that was already tagged under another path

use thiserror::Error;

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod identity;
pub mod logging;
pub mod output;
pub mod publish;
pub mod scan;
pub mod store;
pub mod tags;

#[cfg(test)]
pub mod testing;

pub use engine::{CancellationToken, EngineError};
pub use publish::{PublishOptions, PublishOutcome, PublishRequest, PublishStats, Publisher};
pub use store::{MemoryTagStore, TagStore};
pub use tags::{Tag, TagRegistry, TaggedItem};

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum FanoutError {
    /// Database error
    #[error("Database error: {0}")]
    Db(#[from] db::DbError),
    /// Hashing, comparison, copy or publish error
    #[error("{0}")]
    Engine(#[from] engine::EngineError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
