use std::io;

use rusqlite;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("invalid usage value: {0}")]
    InvalidUsageValue(String),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}
