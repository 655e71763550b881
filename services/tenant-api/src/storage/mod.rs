pub mod contacts;
pub mod credentials;
pub mod error;
pub mod schema;
pub mod uploads;

pub use contacts::{ContactRecord, ContactStore, MessageRecord};
pub use credentials::{CredentialRecord, CredentialStore};
pub use error::StorageError;
pub use uploads::{UploadRecord, UploadStore};

pub const CONTACTS_DB_FILENAME: &str = "contacts.db";
pub const CREDENTIALS_DB_FILENAME: &str = "credentials.db";
pub const UPLOADS_DB_FILENAME: &str = "uploads.db";
