//! Database setup and store selection

use anyhow::{Context, Result};
use mediaconv_core::Config;
use mediaconv_db::{
    InMemoryJobStore, InMemoryMediaStore, JobRepository, JobStore, MediaRepository, MediaStore,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The media store and job transport the service runs on.
#[derive(Clone)]
pub struct Stores {
    pub media: Arc<dyn MediaStore>,
    pub jobs: Arc<dyn JobStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            media: Arc::new(InMemoryMediaStore::new()),
            jobs: Arc::new(InMemoryJobStore::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            media: Arc::new(MediaRepository::new(pool.clone())),
            jobs: Arc::new(JobRepository::new(pool)),
        }
    }
}

/// PostgreSQL when `DATABASE_URL` is set, in-memory stores otherwise.
pub async fn setup_stores(config: &Config) -> Result<Stores> {
    match config.database_url() {
        Some(url) => Ok(Stores::postgres(setup_database(config, url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores; data is lost on restart");
            Ok(Stores::in_memory())
        }
    }
}

/// Setup database connection pool and run migrations
pub async fn setup_database(config: &Config, database_url: &str) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    // Workspace migrations/ relative to this crate's root
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
