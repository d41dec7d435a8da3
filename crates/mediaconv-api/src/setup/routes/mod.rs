//! Route configuration and setup.
//!
//! Health checks live in [health](health).

mod health;

use crate::api_doc::ApiDoc;
use crate::constants::MULTIPART_OVERHEAD_BYTES;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, patch, post},
    Json, Router,
};
use mediaconv_core::Config;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    crate::error::configure_error_rendering(config);

    let body_limit = config
        .max_upload_size_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/", get(handlers::root::root))
        .route("/upload", post(handlers::upload::upload_media))
        .route(
            "/download/{source}/{media_id}",
            get(handlers::download::download_media),
        )
        .route(
            "/media/{media_id}",
            patch(handlers::media::rename_media).delete(handlers::media::delete_media),
        )
        .layer(DefaultBodyLimit::max(body_limit));

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check));

    api_routes
        .merge(health_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
