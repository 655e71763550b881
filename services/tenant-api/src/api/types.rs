use serde::{Deserialize, Serialize};

use crate::storage::{ContactRecord, CredentialRecord, MessageRecord};

/// The legacy dashboard posts camelCase field names; accept both
/// spellings on intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContactRequest {
    pub name: Option<String>,
    #[serde(alias = "phoneNumber")]
    pub phone_number: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "externalId")]
    pub external_id: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    #[serde(alias = "phoneNumber")]
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub contact: ContactRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListContactsResponse {
    pub contacts: Vec<ContactRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub contact_id: String,
    pub content: String,
    pub provider: Option<String>,
    pub instance_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: MessageRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertCredentialRequest {
    pub key_name: String,
    pub key_value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertCredentialResponse {
    pub success: bool,
}

/// Credential as listed back to the tenant; the value never leaves the
/// store unmasked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub key_name: String,
    pub masked_value: String,
    pub description: Option<String>,
    pub updated_at: String,
}

impl From<CredentialRecord> for CredentialSummary {
    fn from(record: CredentialRecord) -> Self {
        Self {
            key_name: record.key_name,
            masked_value: mask_value(&record.key_value),
            description: record.description,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCredentialsResponse {
    pub credentials: Vec<CredentialSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub originalname: String,
    pub mimetype: String,
    pub size: u64,
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}

fn mask_value(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    format!("{prefix}***")
}
