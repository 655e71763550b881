use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::schema::CREDENTIALS_TABLE_SCHEMA;
use super::CREDENTIALS_DB_FILENAME;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: String,
    pub tenant_id: String,
    pub key_name: String,
    pub key_value: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-tenant third-party API credentials, keyed by name. One row per
/// (tenant, key name); writing again overwrites the value.
pub struct CredentialStore {
    conn: Mutex<Connection>,
}

impl CredentialStore {
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(CREDENTIALS_DB_FILENAME);
        let is_new = !db_path.exists();
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        if is_new {
            conn.execute_batch(CREDENTIALS_TABLE_SCHEMA)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn upsert_credential(&self, credential: &CredentialRecord) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO api_credentials (id, tenant_id, key_name, key_value, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(tenant_id, key_name) DO UPDATE SET
                key_value = excluded.key_value,
                description = excluded.description,
                updated_at = excluded.updated_at
            "#,
            params![
                credential.id,
                credential.tenant_id,
                credential.key_name,
                credential.key_value,
                credential.description,
                credential.created_at,
                credential.updated_at
            ],
        )?;

        Ok(())
    }

    pub fn get_credential(
        &self,
        tenant_id: &str,
        key_name: &str,
    ) -> Result<Option<CredentialRecord>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, tenant_id, key_name, key_value, description, created_at, updated_at
            FROM api_credentials
            WHERE tenant_id = ?1 AND key_name = ?2
            "#,
        )?;

        let row = stmt
            .query_row(params![tenant_id, key_name], credential_from_row)
            .optional()?;

        Ok(row)
    }

    pub fn list_credentials(&self, tenant_id: &str) -> Result<Vec<CredentialRecord>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, tenant_id, key_name, key_value, description, created_at, updated_at
            FROM api_credentials
            WHERE tenant_id = ?1
            ORDER BY key_name
            "#,
        )?;

        let rows = stmt.query_map(params![tenant_id], credential_from_row)?;

        let mut credentials = Vec::new();
        for row in rows {
            credentials.push(row?);
        }
        Ok(credentials)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))
    }
}

fn credential_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
    Ok(CredentialRecord {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        key_name: row.get(2)?,
        key_value: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
