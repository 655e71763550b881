use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::tracker::QuotaError;

use super::types::{
    ErrorResponse, ListUsageResponse, RemainingQuotaResponse, ReserveUsageRequest,
    ReserveUsageResponse, ResetUsageResponse,
};
use super::ApiState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub async fn reserve_usage(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ReserveUsageRequest>,
) -> ApiResult<ReserveUsageResponse> {
    if request.tenant_id.trim().is_empty() {
        return Err(bad_request("invalid_tenant_id", "tenant_id cannot be empty"));
    }
    if request.instance_name.trim().is_empty() {
        return Err(bad_request(
            "invalid_instance_name",
            "instance_name cannot be empty",
        ));
    }

    let amount = request.amount.unwrap_or(1);
    match state.tracker.check_and_reserve(
        &request.tenant_id,
        &request.instance_name,
        &request.feature,
        amount,
    ) {
        Ok(usage) => Ok(Json(ReserveUsageResponse { usage })),
        Err(err) => Err(quota_error(err)),
    }
}

pub async fn get_remaining_quota(
    State(state): State<Arc<ApiState>>,
    Path((tenant_id, instance_name, feature)): Path<(String, String, String)>,
) -> ApiResult<RemainingQuotaResponse> {
    match state
        .tracker
        .remaining_quota(&tenant_id, &instance_name, &feature)
    {
        Ok(usage) => Ok(Json(RemainingQuotaResponse { usage })),
        Err(err) => Err(quota_error(err)),
    }
}

pub async fn list_usage(
    State(state): State<Arc<ApiState>>,
    Path(tenant_id): Path<String>,
) -> ApiResult<ListUsageResponse> {
    let records = state
        .tracker
        .usage_for_today(&tenant_id)
        .map_err(quota_error)?;

    Ok(Json(ListUsageResponse { records }))
}

pub async fn reset_usage(
    State(state): State<Arc<ApiState>>,
    Path((tenant_id, instance_name, feature)): Path<(String, String, String)>,
) -> ApiResult<ResetUsageResponse> {
    state
        .tracker
        .reset(&tenant_id, &instance_name, &feature)
        .map_err(quota_error)?;

    Ok(Json(ResetUsageResponse { success: true }))
}

pub async fn health_check() -> ApiResult<serde_json::Value> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "usage-tracker"
    })))
}

fn quota_error(err: QuotaError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        QuotaError::UnknownFeature(feature) => bad_request(
            "unknown_feature",
            &format!("feature {feature} is not metered"),
        ),
        QuotaError::InvalidAmount => {
            bad_request("invalid_amount", "amount must be greater than zero")
        }
        QuotaError::QuotaExceeded {
            limit,
            used,
            requested,
            remaining,
            ..
        } => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "daily limit reached".to_string(),
                code: "quota_exceeded".to_string(),
                details: Some(serde_json::json!({
                    "limit": limit,
                    "used": used,
                    "requested": requested,
                    "remaining": remaining,
                })),
            }),
        ),
        QuotaError::Storage(err) => internal_error(err),
    }
}

fn bad_request(code: &str, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %err, "usage API internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error".to_string(),
            code: "internal_error".to_string(),
            details: Some(serde_json::json!({ "message": err.to_string() })),
        }),
    )
}
