//! One-shot operational check that a tenant's stored Gemini API key
//! still works: fetch the credential, make a single generateContent
//! call, report the outcome. Exits non-zero on any failure.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use crm_hub_tenant_api::config::ApiConfig;
use crm_hub_tenant_api::storage::CredentialStore;

const GEMINI_KEY_NAME: &str = "GEMINI_API_KEY";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "key check failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let tenant_id = args
        .next()
        .context("usage: ai-key-check <tenant-id> [model]")?;
    let model = args.next().unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let config = ApiConfig::from_env()?;
    let store = CredentialStore::new(&config.data_dir)?;

    let credential = store
        .get_credential(&tenant_id, GEMINI_KEY_NAME)?
        .with_context(|| format!("credential {GEMINI_KEY_NAME} not found for tenant {tenant_id}"))?;

    let api_key = credential.key_value.trim().to_string();
    let key_prefix: String = api_key.chars().take(10).collect();
    info!(
        key_prefix = %key_prefix,
        key_len = api_key.len(),
        "found stored key"
    );

    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent?key={api_key}"
    );
    info!(model = %model, "calling generative language endpoint");

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .post(&url)
        .json(&json!({ "contents": [{ "parts": [{ "text": "Hello" }] }] }))
        .send()
        .await
        .context("request to generative language endpoint failed")?;

    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("response was not valid JSON")?;

    if !status.is_success() {
        anyhow::bail!("endpoint responded with {status}: {body}");
    }

    let text = body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|value| value.as_str())
        .unwrap_or("<no text in response>");
    info!(reply = %text, "key works");

    Ok(())
}
