use serde::{Deserialize, Serialize};

use crate::storage::DailyUsageRecord;
use crate::tracker::UsageSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveUsageRequest {
    pub tenant_id: String,
    pub instance_name: String,
    pub feature: String,
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveUsageResponse {
    pub usage: UsageSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemainingQuotaResponse {
    pub usage: UsageSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsageResponse {
    pub records: Vec<DailyUsageRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetUsageResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}
