//! Errors raised by the per-folder database
//!
//! - **`Sled`** / **`Decode`** / **`Encode`**: storage and record format failures
//! - **`InvalidKey`**: a stored key that is not UTF-8
//! - **`InvalidTagName`**, **`TagNotFound`**, **`ItemNotFound`**: bad input
//!   from the caller

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Storage failure: {0}")]
    Sled(#[from] sled::Error),

    #[error("Corrupt record: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Cannot encode record: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Empty, or not usable as a folder name
    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("Tag not found: {0}")]
    TagNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
