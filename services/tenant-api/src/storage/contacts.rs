use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::schema::{CONTACTS_TABLE_SCHEMA, MESSAGES_TABLE_SCHEMA};
use super::CONTACTS_DB_FILENAME;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub external_id: Option<String>,
    pub provider: Option<String>,
    pub stage: String,
    pub last_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub tenant_id: String,
    pub contact_id: String,
    pub content: String,
    pub direction: String,
    pub provider: Option<String>,
    pub status: String,
    pub created_at: String,
}

/// Contacts and their message history. Every query is scoped by tenant
/// so one tenant can never observe another's rows.
pub struct ContactStore {
    conn: Mutex<Connection>,
}

impl ContactStore {
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(CONTACTS_DB_FILENAME);
        let is_new = !db_path.exists();
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        if is_new {
            conn.execute_batch(CONTACTS_TABLE_SCHEMA)?;
            conn.execute_batch(MESSAGES_TABLE_SCHEMA)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn insert_contact(&self, contact: &ContactRecord) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO contacts (id, tenant_id, name, phone_number, email, external_id, provider, stage, last_message, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                contact.id,
                contact.tenant_id,
                contact.name,
                contact.phone_number,
                contact.email,
                contact.external_id,
                contact.provider,
                contact.stage,
                contact.last_message,
                contact.created_at,
                contact.updated_at
            ],
        )?;

        Ok(())
    }

    pub fn get_contact(
        &self,
        tenant_id: &str,
        contact_id: &str,
    ) -> Result<Option<ContactRecord>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, tenant_id, name, phone_number, email, external_id, provider, stage, last_message, created_at, updated_at
            FROM contacts
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )?;

        let row = stmt
            .query_row(params![tenant_id, contact_id], contact_from_row)
            .optional()?;

        Ok(row)
    }

    pub fn list_contacts(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<ContactRecord>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, tenant_id, name, phone_number, email, external_id, provider, stage, last_message, created_at, updated_at
            FROM contacts
            WHERE tenant_id = ?1
            ORDER BY updated_at DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![tenant_id, limit as i64], contact_from_row)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?);
        }
        Ok(contacts)
    }

    pub fn update_contact(&self, contact: &ContactRecord) -> Result<(), StorageError> {
        let conn = self.lock()?;

        let updated = conn.execute(
            r#"
            UPDATE contacts
            SET name = ?3,
                phone_number = ?4,
                email = ?5,
                external_id = ?6,
                provider = ?7,
                stage = ?8,
                last_message = ?9,
                updated_at = ?10
            WHERE tenant_id = ?1 AND id = ?2
            "#,
            params![
                contact.tenant_id,
                contact.id,
                contact.name,
                contact.phone_number,
                contact.email,
                contact.external_id,
                contact.provider,
                contact.stage,
                contact.last_message,
                contact.updated_at
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::ContactNotFound(contact.id.clone()));
        }

        Ok(())
    }

    pub fn touch_last_message(
        &self,
        tenant_id: &str,
        contact_id: &str,
        last_message: &str,
        updated_at: &str,
    ) -> Result<(), StorageError> {
        let conn = self.lock()?;

        let updated = conn.execute(
            r#"
            UPDATE contacts
            SET last_message = ?3,
                updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2
            "#,
            params![tenant_id, contact_id, last_message, updated_at],
        )?;

        if updated == 0 {
            return Err(StorageError::ContactNotFound(contact_id.to_string()));
        }

        Ok(())
    }

    pub fn insert_message(&self, message: &MessageRecord) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO messages (id, tenant_id, contact_id, content, direction, provider, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                message.id,
                message.tenant_id,
                message.contact_id,
                message.content,
                message.direction,
                message.provider,
                message.status,
                message.created_at
            ],
        )?;

        Ok(())
    }

    pub fn list_messages(
        &self,
        tenant_id: &str,
        contact_id: &str,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, tenant_id, contact_id, content, direction, provider, status, created_at
            FROM messages
            WHERE tenant_id = ?1 AND contact_id = ?2
            ORDER BY created_at ASC
            "#,
        )?;

        let rows = stmt.query_map(params![tenant_id, contact_id], |row| {
            Ok(MessageRecord {
                id: row.get(0)?,
                tenant_id: row.get(1)?,
                contact_id: row.get(2)?,
                content: row.get(3)?,
                direction: row.get(4)?,
                provider: row.get(5)?,
                status: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::InvalidRecord("connection poisoned".into()))
    }
}

fn contact_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContactRecord> {
    Ok(ContactRecord {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        phone_number: row.get(3)?,
        email: row.get(4)?,
        external_id: row.get(5)?,
        provider: row.get(6)?,
        stage: row.get(7)?,
        last_message: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
