use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub server_host: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub jwt_secret: Option<String>,
    pub usage_tracker_url: Option<String>,
    pub default_instance_name: String,
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8184,
            data_dir: PathBuf::from("data/crm"),
            uploads_dir: PathBuf::from("uploads"),
            jwt_secret: None,
            usage_tracker_url: None,
            default_instance_name: "default".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(host) = env::var("API_HOST") {
            cfg.server_host = host;
        }
        if let Ok(port) = env::var("API_PORT") {
            cfg.server_port = port.parse().context("API_PORT must be a valid u16")?;
        }
        if let Ok(dir) = env::var("API_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("UPLOADS_DIR") {
            cfg.uploads_dir = PathBuf::from(dir);
        }
        if let Ok(secret) = env::var("AUTH_JWT_SECRET") {
            cfg.jwt_secret = if secret.is_empty() { None } else { Some(secret) };
        }
        if let Ok(url) = env::var("USAGE_TRACKER_URL") {
            cfg.usage_tracker_url = if url.is_empty() { None } else { Some(url) };
        }
        if let Ok(name) = env::var("DEFAULT_INSTANCE_NAME") {
            cfg.default_instance_name = name;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_directory(&self.data_dir)?;
        ensure_directory(&self.uploads_dir)?;

        if let Some(secret) = &self.jwt_secret {
            if secret.trim().is_empty() {
                anyhow::bail!("AUTH_JWT_SECRET must not be blank");
            }
        }
        if self.default_instance_name.trim().is_empty() {
            anyhow::bail!("DEFAULT_INSTANCE_NAME must not be blank");
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
