// error.rs: Error types for the record store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to create the directory holding the database file.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The SQLite backend rejected a statement.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A row body could not be encoded or decoded.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A stored row does not have the shape its table requires.
    #[error("malformed row in {table}: {reason}")]
    MalformedRow { table: String, reason: String },

    /// Column names end up in JSON paths, so only `[A-Za-z0-9_]` is accepted.
    #[error("invalid column name: {0:?}")]
    InvalidColumn(String),

    /// Another thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}
