//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use mediaconv_core::Config;
use std::sync::Arc;

/// Initialize the entire application: telemetry, stores, worker pool and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let stores = database::setup_stores(&config).await?;

    let state = services::initialize_services(&config, stores);
    services::start_job_workers(&state, None);

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
