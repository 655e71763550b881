use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("unknown feature: {0}")]
    UnknownFeature(String),
    #[error("reservation amount must be greater than zero")]
    InvalidAmount,
    #[error(
        "quota exceeded for tenant {tenant_id} instance {instance_name} ({feature}): limit={limit}, used={used}, requested={requested}"
    )]
    QuotaExceeded {
        tenant_id: String,
        instance_name: String,
        feature: String,
        limit: u64,
        used: u64,
        requested: u64,
        remaining: u64,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
