use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers;
use super::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        .route("/api/usage/reserve", post(handlers::reserve_usage))
        .route("/api/usage/:tenant_id", get(handlers::list_usage))
        .route(
            "/api/usage/:tenant_id/:instance_name/:feature",
            get(handlers::get_remaining_quota).delete(handlers::reset_usage),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(middleware)
}
