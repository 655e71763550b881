use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload of {size} bytes exceeds the maximum file size")]
    TooLarge { size: usize },
    #[error("invalid filename: {0}")]
    InvalidFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
