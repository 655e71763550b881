use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct UsageTrackerConfig {
    pub server_host: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub message_send_daily_limit: u64,
    pub ai_call_daily_limit: u64,
    pub log_level: String,
}

impl Default for UsageTrackerConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8183,
            data_dir: PathBuf::from("data/usage"),
            message_send_daily_limit: 40,
            ai_call_daily_limit: 100,
            log_level: "info".to_string(),
        }
    }
}

impl UsageTrackerConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(host) = env::var("USAGE_HOST") {
            cfg.server_host = host;
        }
        if let Ok(port) = env::var("USAGE_PORT") {
            cfg.server_port = port.parse().context("USAGE_PORT must be a valid u16")?;
        }
        if let Ok(dir) = env::var("USAGE_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(limit) = env::var("MESSAGE_SEND_DAILY_LIMIT") {
            cfg.message_send_daily_limit = limit
                .parse()
                .context("MESSAGE_SEND_DAILY_LIMIT must be a positive integer")?;
        }
        if let Ok(limit) = env::var("AI_CALL_DAILY_LIMIT") {
            cfg.ai_call_daily_limit = limit
                .parse()
                .context("AI_CALL_DAILY_LIMIT must be a positive integer")?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_directory(&self.data_dir)?;

        if self.message_send_daily_limit == 0 {
            anyhow::bail!("MESSAGE_SEND_DAILY_LIMIT must be greater than zero");
        }
        if self.ai_call_daily_limit == 0 {
            anyhow::bail!("AI_CALL_DAILY_LIMIT must be greater than zero");
        }

        Ok(())
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("{} exists but is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("unable to create data directory {}", path.display()))?;
    }
    Ok(())
}
