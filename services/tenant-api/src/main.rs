use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crm_hub_tenant_api::api::{self, ApiState};
use crm_hub_tenant_api::config::ApiConfig;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = ApiConfig::from_env()?;
    let host = config.server_host.clone();
    let port = config.server_port;

    info!(
        host = %host,
        port,
        data_dir = %config.data_dir.display(),
        uploads_dir = %config.uploads_dir.display(),
        "starting tenant-api service"
    );

    let state = Arc::new(ApiState::new(config)?);

    if state.auth.jwt_enabled() {
        info!("bearer token auth enabled");
    } else {
        warn!("AUTH_JWT_SECRET not set; honoring X-Tenant-ID header (testing mode)");
    }
    if state.quota.is_some() {
        info!("message sends are metered through the usage tracker");
    } else {
        warn!("USAGE_TRACKER_URL not set; message sends are unmetered");
    }

    let router = api::create_router(Arc::clone(&state));
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("tenant-api service shutting down");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(anyhow::Error::msg)?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
