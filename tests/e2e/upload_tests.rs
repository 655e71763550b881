use anyhow::Result;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::harness::stack;
use crm_hub_tenant_api::uploads::MAX_UPLOAD_BYTES;

async fn upload(
    stack: &crate::harness::E2eStack,
    file_name: &str,
    mime: &str,
    data: Vec<u8>,
) -> Result<reqwest::Response> {
    let part = Part::bytes(data)
        .file_name(file_name.to_string())
        .mime_str(mime)?;
    let form = Form::new().part("file", part);

    let response = stack
        .client
        .post(format!("{}/uploads", stack.api.base_url))
        .multipart(form)
        .send()
        .await?;
    Ok(response)
}

#[tokio::test]
async fn upload_and_fetch_round_trip() -> Result<()> {
    let stack = stack().await?;

    let response = upload(&stack, "greeting.txt", "text/plain", b"hello world".to_vec()).await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;

    let filename = body["filename"].as_str().expect("filename");
    assert!(filename.starts_with("greeting-"));
    assert!(filename.ends_with(".txt"));
    assert_eq!(body["originalname"], "greeting.txt");
    assert_eq!(body["mimetype"], "text/plain");
    assert_eq!(body["size"], 11);
    assert_eq!(body["url"], format!("/uploads/{filename}"));

    let response = stack
        .client
        .get(format!("{}/uploads/{}", stack.api.base_url, filename))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("text/plain")
    );
    assert_eq!(response.bytes().await?.as_ref(), b"hello world");

    Ok(())
}

#[tokio::test]
async fn missing_file_field_is_rejected() -> Result<()> {
    let stack = stack().await?;

    let form = Form::new().text("note", "no file here");
    let response = stack
        .client
        .post(format!("{}/uploads", stack.api.base_url))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "missing_file");

    Ok(())
}

#[tokio::test]
async fn size_cap_is_exact() -> Result<()> {
    let stack = stack().await?;

    // Exactly at the cap is accepted.
    let response = upload(
        &stack,
        "exact.bin",
        "application/octet-stream",
        vec![0u8; MAX_UPLOAD_BYTES],
    )
    .await?;
    assert_eq!(response.status(), 200);

    // One byte over is refused.
    let response = upload(
        &stack,
        "over.bin",
        "application/octet-stream",
        vec![0u8; MAX_UPLOAD_BYTES + 1],
    )
    .await?;
    assert_eq!(response.status(), 413);

    Ok(())
}

#[tokio::test]
async fn unknown_filename_is_not_found() -> Result<()> {
    let stack = stack().await?;

    let response = stack
        .client
        .get(format!("{}/uploads/never-written.txt", stack.api.base_url))
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body["code"], "file_not_found");

    Ok(())
}
