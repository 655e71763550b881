use anyhow::Result;
use serde_json::{json, Value};

use crate::harness::{bearer_token, create_contact, random_tenant_id, stack, stack_with_limits};

#[tokio::test]
async fn contacts_require_auth_and_stay_tenant_scoped() -> Result<()> {
    let stack = stack().await?;
    let tenant_a = random_tenant_id();
    let tenant_b = random_tenant_id();
    let token_a = bearer_token(&tenant_a);
    let token_b = bearer_token(&tenant_b);

    // No token at all is rejected.
    let response = stack
        .client
        .post(format!("{}/api/crm/contacts", stack.api.base_url))
        .json(&json!({ "name": "Ana" }))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    let created = create_contact(&stack, &token_a, "Ana").await?;
    let contact_id = created["contact"]["id"].as_str().expect("contact id").to_string();
    assert_eq!(created["contact"]["stage"], "LEAD");

    // Tenant A sees its contact, tenant B does not.
    let response = stack
        .client
        .get(format!("{}/api/crm/contacts", stack.api.base_url))
        .bearer_auth(&token_a)
        .send()
        .await?;
    let body: Value = response.json().await?;
    assert_eq!(body["contacts"].as_array().expect("contacts").len(), 1);

    let response = stack
        .client
        .get(format!("{}/api/crm/contacts", stack.api.base_url))
        .bearer_auth(&token_b)
        .send()
        .await?;
    let body: Value = response.json().await?;
    assert!(body["contacts"].as_array().expect("contacts").is_empty());

    let response = stack
        .client
        .get(format!(
            "{}/api/crm/contacts/{}",
            stack.api.base_url, contact_id
        ))
        .bearer_auth(&token_b)
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn contact_stage_can_be_updated() -> Result<()> {
    let stack = stack().await?;
    let tenant = random_tenant_id();
    let token = bearer_token(&tenant);

    let created = create_contact(&stack, &token, "Bruno").await?;
    let contact_id = created["contact"]["id"].as_str().expect("contact id");

    let response = stack
        .client
        .patch(format!(
            "{}/api/crm/contacts/{}",
            stack.api.base_url, contact_id
        ))
        .bearer_auth(&token)
        .json(&json!({ "stage": "NEGOTIATION" }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["contact"]["stage"], "NEGOTIATION");

    Ok(())
}

#[tokio::test]
async fn message_sends_are_metered() -> Result<()> {
    // message_send limit of 2 for the whole day.
    let stack = stack_with_limits(2, 100).await?;
    let tenant = random_tenant_id();
    let token = bearer_token(&tenant);

    let created = create_contact(&stack, &token, "Carla").await?;
    let contact_id = created["contact"]["id"].as_str().expect("contact id");

    for text in ["oi", "tudo bem?"] {
        let response = stack
            .client
            .post(format!("{}/api/crm/messages", stack.api.base_url))
            .bearer_auth(&token)
            .json(&json!({
                "contact_id": contact_id,
                "content": text,
                "provider": "whatsapp",
            }))
            .send()
            .await?;
        assert_eq!(response.status(), 200);
    }

    // Third send of the day is refused by the tracker.
    let response = stack
        .client
        .post(format!("{}/api/crm/messages", stack.api.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "contact_id": contact_id,
            "content": "mais uma",
            "provider": "whatsapp",
        }))
        .send()
        .await?;
    assert_eq!(response.status(), 429);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "quota_exceeded");

    // Only the two admitted messages were recorded.
    let response = stack
        .client
        .get(format!(
            "{}/api/crm/contacts/{}/messages",
            stack.api.base_url, contact_id
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = response.json().await?;
    assert_eq!(body["messages"].as_array().expect("messages").len(), 2);

    Ok(())
}

#[tokio::test]
async fn credentials_are_listed_masked() -> Result<()> {
    let stack = stack().await?;
    let tenant = random_tenant_id();
    let token = bearer_token(&tenant);

    let response = stack
        .client
        .post(format!(
            "{}/api/integrations/credentials",
            stack.api.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({
            "key_name": "GEMINI_API_KEY",
            "key_value": "AIzaSyExampleValue",
            "description": "generative AI key",
        }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let response = stack
        .client
        .get(format!(
            "{}/api/integrations/credentials",
            stack.api.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = response.json().await?;
    let credentials = body["credentials"].as_array().expect("credentials");
    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0]["key_name"], "GEMINI_API_KEY");
    assert_eq!(credentials[0]["masked_value"], "AIza***");

    Ok(())
}
