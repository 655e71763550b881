use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::error;

use crm_hub_tenant_api::api as tenant_api;
use crm_hub_tenant_api::config::ApiConfig;
use crm_hub_usage_tracker::api as usage_api;
use crm_hub_usage_tracker::config::UsageTrackerConfig;
use crm_hub_usage_tracker::storage::UsageDatabase;
use crm_hub_usage_tracker::tracker::{QuotaPolicy, SystemClock, UsageTracker};

/// A service running inside the test process. The serve task is aborted
/// when the handle drops.
pub struct ServiceHandle {
    pub base_url: String,
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(router: axum::Router) -> Result<ServiceHandle> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("binding ephemeral port")?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!(error = %err, "in-process test service exited");
        }
    });

    Ok(ServiceHandle {
        base_url: format!("http://{addr}"),
        addr,
        handle,
    })
}

pub async fn start_usage_tracker(config: UsageTrackerConfig) -> Result<ServiceHandle> {
    let database = Arc::new(UsageDatabase::new(config.data_dir.clone())?);
    let policy = QuotaPolicy::from_config(&config)?;
    let tracker = Arc::new(UsageTracker::new(database, policy, Arc::new(SystemClock)));
    let state = Arc::new(usage_api::ApiState::new(tracker, config));
    serve(usage_api::create_router(state)).await
}

pub async fn start_tenant_api(config: ApiConfig) -> Result<ServiceHandle> {
    let state = Arc::new(tenant_api::ApiState::new(config)?);
    serve(tenant_api::create_router(state)).await
}

pub fn usage_config(data_dir: &Path, message_send: u64, ai_call: u64) -> UsageTrackerConfig {
    let mut config = UsageTrackerConfig::default();
    config.data_dir = data_dir.to_path_buf();
    config.message_send_daily_limit = message_send;
    config.ai_call_daily_limit = ai_call;
    config
}

pub fn tenant_config(data_dir: &Path, uploads_dir: &Path) -> ApiConfig {
    let mut config = ApiConfig::default();
    config.data_dir = data_dir.to_path_buf();
    config.uploads_dir = uploads_dir.to_path_buf();
    config
}
