use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::uploads::{MAX_UPLOAD_BYTES, UPLOAD_BODY_OVERHEAD_BYTES};

use super::handlers;
use super::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        .route(
            "/api/crm/contacts",
            post(handlers::create_contact).get(handlers::list_contacts),
        )
        .route(
            "/api/crm/contacts/:contact_id",
            get(handlers::get_contact).patch(handlers::update_contact),
        )
        .route(
            "/api/crm/contacts/:contact_id/messages",
            get(handlers::list_contact_messages),
        )
        .route("/api/crm/messages", post(handlers::send_message))
        .route(
            "/api/integrations/credentials",
            post(handlers::upsert_credential).get(handlers::list_credentials),
        )
        .route(
            "/uploads",
            post(handlers::upload_file)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + UPLOAD_BODY_OVERHEAD_BYTES)),
        )
        .route("/uploads/:filename", get(handlers::serve_file))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(middleware)
}
