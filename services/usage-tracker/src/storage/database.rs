use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::schema::init_database;
use super::USAGE_DB_FILENAME;

/// Composite key of one usage counter. Exactly one row exists per key.
#[derive(Debug, Clone, Copy)]
pub struct UsageKey<'a> {
    pub tenant_id: &'a str,
    pub instance_name: &'a str,
    pub feature: &'a str,
    pub day: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUsageRecord {
    pub tenant_id: String,
    pub instance_name: String,
    pub feature: String,
    pub day: String,
    pub count: u64,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy)]
pub enum ReserveOutcome {
    Admitted { used: u64 },
    Rejected { used: u64 },
}

pub struct UsageDatabase {
    conn: Mutex<Connection>,
}

impl UsageDatabase {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join(USAGE_DB_FILENAME);
        let is_new = !db_path.exists();
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        if is_new {
            init_database(&conn)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Atomically reserve `amount` against `limit` for one counter.
    ///
    /// The conditional update either moves the counter to
    /// `count + amount` (only when that stays within `limit`) or leaves
    /// the row untouched. Concurrent reservations serialize on the
    /// immediate transaction, so the stored counter can never overshoot
    /// the limit.
    pub fn reserve(
        &self,
        key: &UsageKey<'_>,
        amount: u64,
        limit: u64,
    ) -> Result<ReserveOutcome, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            r#"
            INSERT INTO daily_usage (tenant_id, instance_name, feature, day, count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
            ON CONFLICT(tenant_id, instance_name, feature, day) DO NOTHING
            "#,
            params![key.tenant_id, key.instance_name, key.feature, key.day, now],
        )?;

        let updated = tx.execute(
            r#"
            UPDATE daily_usage
            SET count = count + ?5,
                updated_at = ?6
            WHERE tenant_id = ?1 AND instance_name = ?2 AND feature = ?3 AND day = ?4
              AND count + ?5 <= ?7
            "#,
            params![
                key.tenant_id,
                key.instance_name,
                key.feature,
                key.day,
                amount as i64,
                now,
                limit as i64
            ],
        )?;

        let used: i64 = tx.query_row(
            r#"
            SELECT count
            FROM daily_usage
            WHERE tenant_id = ?1 AND instance_name = ?2 AND feature = ?3 AND day = ?4
            "#,
            params![key.tenant_id, key.instance_name, key.feature, key.day],
            |row| row.get(0),
        )?;

        tx.commit()?;

        if updated == 1 {
            Ok(ReserveOutcome::Admitted { used: used as u64 })
        } else {
            Ok(ReserveOutcome::Rejected { used: used as u64 })
        }
    }

    pub fn load_count(&self, key: &UsageKey<'_>) -> Result<u64, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT count
            FROM daily_usage
            WHERE tenant_id = ?1 AND instance_name = ?2 AND feature = ?3 AND day = ?4
            "#,
        )?;

        let count = stmt
            .query_row(
                params![key.tenant_id, key.instance_name, key.feature, key.day],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        Ok(count.unwrap_or(0) as u64)
    }

    /// Overwrite one stored counter. Used by the reset operation and by
    /// tests that need a row in a specific state.
    pub fn save_count(&self, key: &UsageKey<'_>, count: u64) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO daily_usage (tenant_id, instance_name, feature, day, count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(tenant_id, instance_name, feature, day) DO UPDATE SET
                count = excluded.count,
                updated_at = excluded.updated_at
            "#,
            params![
                key.tenant_id,
                key.instance_name,
                key.feature,
                key.day,
                count as i64,
                now
            ],
        )?;

        Ok(())
    }

    pub fn list_usage(
        &self,
        tenant_id: &str,
        day: &str,
    ) -> Result<Vec<DailyUsageRecord>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT tenant_id, instance_name, feature, day, count, updated_at
            FROM daily_usage
            WHERE tenant_id = ?1 AND day = ?2
            ORDER BY instance_name, feature
            "#,
        )?;

        let rows = stmt.query_map(params![tenant_id, day], |row| {
            Ok(DailyUsageRecord {
                tenant_id: row.get(0)?,
                instance_name: row.get(1)?,
                feature: row.get(2)?,
                day: row.get(3)?,
                count: row.get::<_, i64>(4)? as u64,
                updated_at: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::InvalidUsageValue("connection poisoned".into()))
    }
}
