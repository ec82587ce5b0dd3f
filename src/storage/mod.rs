//! Storage mechanisms for the status service
//!
//! Every piece of persisted state is a whole JSON document in a named slot.

pub mod document;

use thiserror::Error;

pub use document::{load_or, save, DocumentStore, JsonFileStore, MemoryStore};

/// Error types for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
