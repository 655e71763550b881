use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::quota::{QuotaClientError, MESSAGE_SEND_FEATURE};
use crate::storage::{ContactRecord, CredentialRecord, MessageRecord, UploadRecord};
use crate::uploads::{UploadError, MAX_UPLOAD_BYTES};

use super::types::{
    ContactResponse, CreateContactRequest, CredentialSummary, ErrorResponse,
    ListContactsResponse, ListCredentialsResponse, ListMessagesResponse, MessageResponse,
    SendMessageRequest, UpdateContactRequest, UploadResponse, UpsertCredentialRequest,
    UpsertCredentialResponse,
};
use super::ApiState;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn create_contact(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), ApiError> {
    let context = authenticate(&state, &headers)?;

    let now = Utc::now().to_rfc3339();
    let contact = ContactRecord {
        id: Uuid::new_v4().to_string(),
        tenant_id: context.tenant_id.clone(),
        name: request.name,
        phone_number: request.phone_number,
        email: request.email,
        external_id: request.external_id,
        provider: request.provider,
        stage: "LEAD".to_string(),
        last_message: None,
        created_at: now.clone(),
        updated_at: now,
    };

    state
        .contacts
        .insert_contact(&contact)
        .map_err(internal_error)?;

    info!(
        tenant_id = %context.tenant_id,
        contact_id = %contact.id,
        "created contact"
    );

    Ok((StatusCode::CREATED, Json(ContactResponse { contact })))
}

pub async fn list_contacts(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> ApiResult<ListContactsResponse> {
    let context = authenticate(&state, &headers)?;

    let contacts = state
        .contacts
        .list_contacts(&context.tenant_id, 20)
        .map_err(internal_error)?;

    Ok(Json(ListContactsResponse { contacts }))
}

pub async fn get_contact(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(contact_id): Path<String>,
) -> ApiResult<ContactResponse> {
    let context = authenticate(&state, &headers)?;

    let contact = state
        .contacts
        .get_contact(&context.tenant_id, &contact_id)
        .map_err(internal_error)?;

    match contact {
        Some(contact) => Ok(Json(ContactResponse { contact })),
        None => Err(not_found("contact_not_found", "contact not found")),
    }
}

pub async fn update_contact(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(contact_id): Path<String>,
    Json(request): Json<UpdateContactRequest>,
) -> ApiResult<ContactResponse> {
    let context = authenticate(&state, &headers)?;

    let existing = state
        .contacts
        .get_contact(&context.tenant_id, &contact_id)
        .map_err(internal_error)?;

    let mut contact = match existing {
        Some(contact) => contact,
        None => return Err(not_found("contact_not_found", "contact not found")),
    };

    if let Some(name) = request.name {
        contact.name = Some(name);
    }
    if let Some(phone_number) = request.phone_number {
        contact.phone_number = Some(phone_number);
    }
    if let Some(email) = request.email {
        contact.email = Some(email);
    }
    if let Some(stage) = request.stage {
        if stage.trim().is_empty() {
            return Err(bad_request("invalid_stage", "stage cannot be empty"));
        }
        contact.stage = stage;
    }
    contact.updated_at = Utc::now().to_rfc3339();

    state
        .contacts
        .update_contact(&contact)
        .map_err(internal_error)?;

    info!(
        tenant_id = %context.tenant_id,
        contact_id = %contact.id,
        stage = %contact.stage,
        "updated contact"
    );

    Ok(Json(ContactResponse { contact }))
}

pub async fn list_contact_messages(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(contact_id): Path<String>,
) -> ApiResult<ListMessagesResponse> {
    let context = authenticate(&state, &headers)?;

    if state
        .contacts
        .get_contact(&context.tenant_id, &contact_id)
        .map_err(internal_error)?
        .is_none()
    {
        return Err(not_found("contact_not_found", "contact not found"));
    }

    let messages = state
        .contacts
        .list_messages(&context.tenant_id, &contact_id)
        .map_err(internal_error)?;

    Ok(Json(ListMessagesResponse { messages }))
}

pub async fn send_message(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<MessageResponse> {
    let context = authenticate(&state, &headers)?;

    if request.content.trim().is_empty() {
        return Err(bad_request("invalid_content", "content cannot be empty"));
    }

    let contact = state
        .contacts
        .get_contact(&context.tenant_id, &request.contact_id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found("contact_not_found", "contact not found"))?;

    let instance_name = request
        .instance_name
        .clone()
        .unwrap_or_else(|| state.config.default_instance_name.clone());

    if let Some(quota) = &state.quota {
        match quota
            .reserve(&context.tenant_id, &instance_name, MESSAGE_SEND_FEATURE, 1)
            .await
        {
            Ok(usage) => {
                debug!(
                    tenant_id = %context.tenant_id,
                    instance_name = %instance_name,
                    remaining = usage.remaining,
                    "reserved message quota"
                );
            }
            Err(QuotaClientError::QuotaExceeded { message, details }) => {
                return Err((
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ErrorResponse {
                        error: message,
                        code: "quota_exceeded".to_string(),
                        details,
                    }),
                ));
            }
            Err(err) => return Err(internal_error(err)),
        }
    } else {
        debug!("usage tracker not configured; sending unmetered");
    }

    let now = Utc::now().to_rfc3339();
    let message = MessageRecord {
        id: Uuid::new_v4().to_string(),
        tenant_id: context.tenant_id.clone(),
        contact_id: contact.id.clone(),
        content: request.content,
        direction: "outbound".to_string(),
        provider: request.provider,
        status: "PENDING".to_string(),
        created_at: now.clone(),
    };

    state
        .contacts
        .insert_message(&message)
        .map_err(internal_error)?;
    state
        .contacts
        .touch_last_message(&context.tenant_id, &contact.id, &message.content, &now)
        .map_err(internal_error)?;

    info!(
        tenant_id = %context.tenant_id,
        contact_id = %contact.id,
        message_id = %message.id,
        "recorded outbound message"
    );

    Ok(Json(MessageResponse { message }))
}

pub async fn upsert_credential(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<UpsertCredentialRequest>,
) -> ApiResult<UpsertCredentialResponse> {
    let context = authenticate(&state, &headers)?;

    if request.key_name.trim().is_empty() {
        return Err(bad_request("invalid_key_name", "key_name cannot be empty"));
    }
    if request.key_value.trim().is_empty() {
        return Err(bad_request(
            "invalid_key_value",
            "key_value cannot be empty",
        ));
    }

    let now = Utc::now().to_rfc3339();
    let credential = CredentialRecord {
        id: Uuid::new_v4().to_string(),
        tenant_id: context.tenant_id.clone(),
        key_name: request.key_name,
        key_value: request.key_value,
        description: request.description,
        created_at: now.clone(),
        updated_at: now,
    };

    state
        .credentials
        .upsert_credential(&credential)
        .map_err(internal_error)?;

    info!(
        tenant_id = %context.tenant_id,
        key_name = %credential.key_name,
        "stored api credential"
    );

    Ok(Json(UpsertCredentialResponse { success: true }))
}

pub async fn list_credentials(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> ApiResult<ListCredentialsResponse> {
    let context = authenticate(&state, &headers)?;

    let credentials = state
        .credentials
        .list_credentials(&context.tenant_id)
        .map_err(internal_error)?
        .into_iter()
        .map(CredentialSummary::from)
        .collect();

    Ok(Json(ListCredentialsResponse { credentials }))
}

pub async fn upload_file(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut file_field = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request("invalid_multipart", &err.to_string()))?
    {
        if field.name() == Some("file") {
            let original_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(|err| {
                bad_request(
                    "invalid_multipart",
                    &format!("failed to read upload body: {err}"),
                )
            })?;
            file_field = Some((original_name, content_type, data));
            break;
        }
    }

    let (original_name, content_type, data) =
        file_field.ok_or_else(|| bad_request("missing_file", "file upload failed: no file field"))?;

    let stored = match state.files.store(&original_name, &data).await {
        Ok(stored) => stored,
        Err(UploadError::TooLarge { size }) => {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorResponse {
                    error: format!(
                        "upload of {size} bytes exceeds the {MAX_UPLOAD_BYTES} byte limit"
                    ),
                    code: "payload_too_large".to_string(),
                    details: None,
                }),
            ));
        }
        Err(err) => return Err(internal_error(err)),
    };

    let record = UploadRecord {
        filename: stored.filename.clone(),
        original_name: stored.original_name.clone(),
        content_type,
        size_bytes: stored.size as u64,
        path: stored.path.display().to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    state
        .upload_index
        .record_upload(&record)
        .map_err(internal_error)?;

    info!(
        filename = %record.filename,
        size = record.size_bytes,
        "stored upload"
    );

    Ok(Json(UploadResponse {
        url: format!("/uploads/{}", record.filename),
        filename: record.filename,
        originalname: record.original_name,
        mimetype: record.content_type,
        size: record.size_bytes,
        path: record.path,
    }))
}

pub async fn serve_file(
    State(state): State<Arc<ApiState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let record = state
        .upload_index
        .get_upload(&filename)
        .map_err(internal_error)?;

    let bytes = match state.files.open(&filename).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Err(not_found("file_not_found", "file not found")),
        Err(UploadError::InvalidFilename(_)) => {
            return Err(bad_request(
                "invalid_filename",
                "filename may not contain path separators",
            ));
        }
        Err(err) => return Err(internal_error(err)),
    };

    let content_type = record
        .map(|record| record.content_type)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .map_err(internal_error)
}

pub async fn health_check() -> ApiResult<serde_json::Value> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "tenant-api"
    })))
}

fn authenticate(state: &ApiState, headers: &HeaderMap) -> Result<TenantContext, ApiError> {
    state.auth.extract_from_request(headers).map_err(|err| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: err.to_string(),
                code: "unauthorized".to_string(),
                details: None,
            }),
        )
    })
}

fn bad_request(code: &str, message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn not_found(code: &str, message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    error!(error = %err, "tenant API internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error".to_string(),
            code: "internal_error".to_string(),
            details: Some(serde_json::json!({ "message": err.to_string() })),
        }),
    )
}
