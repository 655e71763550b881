pub mod error;
pub mod store;

pub use error::UploadError;
pub use store::{FileStore, StoredFile};

/// Hard cap on a single uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Headroom allowed on top of the file cap for multipart framing.
pub const UPLOAD_BODY_OVERHEAD_BYTES: usize = 64 * 1024;
