use anyhow::Result;
use serde_json::Value;

use crate::harness::{random_tenant_id, reserve, stack};

#[tokio::test]
async fn reserve_until_daily_limit() -> Result<()> {
    let stack = stack().await?;
    let tenant = random_tenant_id();

    // ai_call limit is 100: 60 fits, 50 does not, the remaining 40 does.
    let response = reserve(&stack, &tenant, "main", "ai_call", 60).await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["usage"]["used"], 60);
    assert_eq!(body["usage"]["remaining"], 40);

    let response = reserve(&stack, &tenant, "main", "ai_call", 50).await?;
    assert_eq!(response.status(), 429);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "quota_exceeded");
    assert_eq!(body["details"]["remaining"], 40);

    // The rejection must not have consumed anything.
    let response = stack
        .client
        .get(format!(
            "{}/api/usage/{}/main/ai_call",
            stack.usage.base_url, tenant
        ))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["usage"]["used"], 60);
    assert_eq!(body["usage"]["remaining"], 40);

    let response = reserve(&stack, &tenant, "main", "ai_call", 40).await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["usage"]["remaining"], 0);

    Ok(())
}

#[tokio::test]
async fn unknown_feature_is_rejected() -> Result<()> {
    let stack = stack().await?;
    let tenant = random_tenant_id();

    let response = reserve(&stack, &tenant, "main", "video_call", 1).await?;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "unknown_feature");

    Ok(())
}

#[tokio::test]
async fn zero_amount_is_rejected() -> Result<()> {
    let stack = stack().await?;
    let tenant = random_tenant_id();

    let response = reserve(&stack, &tenant, "main", "message_send", 0).await?;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "invalid_amount");

    Ok(())
}

#[tokio::test]
async fn reset_restores_full_quota() -> Result<()> {
    let stack = stack().await?;
    let tenant = random_tenant_id();

    let response = reserve(&stack, &tenant, "main", "message_send", 10).await?;
    assert_eq!(response.status(), 200);

    let response = stack
        .client
        .delete(format!(
            "{}/api/usage/{}/main/message_send",
            stack.usage.base_url, tenant
        ))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let response = stack
        .client
        .get(format!(
            "{}/api/usage/{}/main/message_send",
            stack.usage.base_url, tenant
        ))
        .send()
        .await?;
    let body: Value = response.json().await?;
    assert_eq!(body["usage"]["used"], 0);
    assert_eq!(body["usage"]["remaining"], 40);

    Ok(())
}

#[tokio::test]
async fn usage_listing_reflects_reservations() -> Result<()> {
    let stack = stack().await?;
    let tenant = random_tenant_id();

    reserve(&stack, &tenant, "line-1", "message_send", 3).await?;
    reserve(&stack, &tenant, "line-2", "ai_call", 5).await?;

    let response = stack
        .client
        .get(format!("{}/api/usage/{}", stack.usage.base_url, tenant))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    let records = body["records"].as_array().expect("records array");
    assert_eq!(records.len(), 2);

    Ok(())
}
