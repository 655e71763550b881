use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::schema::UPLOADS_TABLE_SCHEMA;
use super::UPLOADS_DB_FILENAME;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub filename: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub path: String,
    pub created_at: String,
}

/// Metadata index over the upload directory, keyed by stored filename.
pub struct UploadStore {
    conn: Mutex<Connection>,
}

impl UploadStore {
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(UPLOADS_DB_FILENAME);
        let is_new = !db_path.exists();
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        if is_new {
            conn.execute_batch(UPLOADS_TABLE_SCHEMA)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn record_upload(&self, upload: &UploadRecord) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO uploads (filename, original_name, content_type, size_bytes, path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                upload.filename,
                upload.original_name,
                upload.content_type,
                upload.size_bytes as i64,
                upload.path,
                upload.created_at
            ],
        )?;

        Ok(())
    }

    pub fn get_upload(&self, filename: &str) -> Result<Option<UploadRecord>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT filename, original_name, content_type, size_bytes, path, created_at
            FROM uploads
            WHERE filename = ?1
            "#,
        )?;

        let row = stmt
            .query_row(params![filename], |row| {
                Ok(UploadRecord {
                    filename: row.get(0)?,
                    original_name: row.get(1)?,
                    content_type: row.get(2)?,
                    size_bytes: row.get::<_, i64>(3)? as u64,
                    path: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .optional()?;

        Ok(row)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))
    }
}
