#![allow(dead_code)]

use std::time::Duration;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use crm_hub::test_support::{
    start_tenant_api, start_usage_tracker, tenant_config, usage_config, ServiceHandle,
};

pub const TEST_JWT_SECRET: &str = "e2e-suite-secret";

/// Both services wired together: tenant-api meters sends through the
/// in-process usage tracker.
pub struct E2eStack {
    pub usage: ServiceHandle,
    pub api: ServiceHandle,
    pub client: Client,
    pub temp: TempDir,
}

pub async fn stack() -> Result<E2eStack> {
    stack_with_limits(40, 100).await
}

pub async fn stack_with_limits(message_send: u64, ai_call: u64) -> Result<E2eStack> {
    let temp = TempDir::new()?;

    let usage =
        start_usage_tracker(usage_config(&temp.path().join("usage"), message_send, ai_call))
            .await?;

    let mut api_config = tenant_config(&temp.path().join("crm"), &temp.path().join("uploads"));
    api_config.jwt_secret = Some(TEST_JWT_SECRET.to_string());
    api_config.usage_tracker_url = Some(usage.base_url.clone());
    let api = start_tenant_api(api_config).await?;

    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

    Ok(E2eStack {
        usage,
        api,
        client,
        temp,
    })
}

pub fn bearer_token(tenant_id: &str) -> String {
    let exp = (Utc::now() + ChronoDuration::hours(1)).timestamp() as usize;
    encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": "e2e-user", "tenant_id": tenant_id, "exp": exp }),
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("token should encode")
}

pub fn random_tenant_id() -> String {
    format!("tenant-{}", Uuid::new_v4().simple())
}

pub async fn reserve(
    stack: &E2eStack,
    tenant_id: &str,
    instance_name: &str,
    feature: &str,
    amount: u64,
) -> Result<reqwest::Response> {
    let response = stack
        .client
        .post(format!("{}/api/usage/reserve", stack.usage.base_url))
        .json(&json!({
            "tenant_id": tenant_id,
            "instance_name": instance_name,
            "feature": feature,
            "amount": amount,
        }))
        .send()
        .await?;
    Ok(response)
}

pub async fn create_contact(
    stack: &E2eStack,
    token: &str,
    name: &str,
) -> Result<serde_json::Value> {
    let response = stack
        .client
        .post(format!("{}/api/crm/contacts", stack.api.base_url))
        .bearer_auth(token)
        .json(&json!({
            "name": name,
            "phone_number": "+5511999990000",
            "email": format!("{}@example.com", name.to_lowercase()),
            "external_id": null,
        }))
        .send()
        .await?;
    anyhow::ensure!(
        response.status() == 201,
        "contact creation failed: {}",
        response.status()
    );
    Ok(response.json().await?)
}
