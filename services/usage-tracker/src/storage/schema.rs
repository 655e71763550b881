use anyhow::Result;
use rusqlite::Connection;

pub const DAILY_USAGE_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS daily_usage (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tenant_id TEXT NOT NULL,
    instance_name TEXT NOT NULL,
    feature TEXT NOT NULL,
    day TEXT NOT NULL,
    count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(tenant_id, instance_name, feature, day)
);
"#;

pub const DAILY_USAGE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_daily_usage_tenant_day ON daily_usage(tenant_id, day);
"#;

pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(DAILY_USAGE_TABLE_SCHEMA)?;
    conn.execute_batch(DAILY_USAGE_INDEXES)?;
    Ok(())
}
