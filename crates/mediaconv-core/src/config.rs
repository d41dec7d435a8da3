//! Configuration module
//!
//! Loads the service configuration from the environment (and a `.env` file when present):
//! server and database settings, conversion bounds, and job queue tuning.

use std::env;

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
// One week
const MAX_RETRY_BACKOFF_SECS: u64 = 7 * 24 * 60 * 60;

/// Convert the configured upload limit to bytes, rejecting values that overflow `usize`.
fn upload_limit_bytes(megabytes: usize) -> Result<usize, anyhow::Error> {
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB ({}) is too large", megabytes))
}

/// Output format for the tracing subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "compact" | "" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Settings shared by every process of the service.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub log_format: LogFormat,
}

/// Media converter configuration
#[derive(Clone, Debug)]
pub struct MediaConverterConfig {
    pub base: BaseConfig,
    /// `None` runs the service on in-memory stores.
    pub database_url: Option<String>,
    // Submission
    pub max_upload_size_bytes: usize,
    // Rasterization
    pub conversion_max_dimension: u32,
    pub pdf_render_dpi: u32,
    pub pdfium_lib_path: Option<String>,
    // Job queue
    pub job_queue_max_workers: usize,
    pub job_queue_poll_interval_ms: u64,
    pub job_max_attempts: u32,
    pub job_retry_base_delay_ms: u64,
    pub job_retry_max_backoff_secs: u64,
    pub job_timeout_secs: u64,
    /// Age after which a `Running` claim is considered abandoned.
    pub job_visibility_timeout_secs: u64,
    /// Interval between stale claim sweeps. 0 = disabled.
    pub job_reap_interval_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaConverterConfig>);

impl Config {
    fn as_converter(&self) -> &MediaConverterConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_converter().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = MediaConverterConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_converter().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_converter().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_converter().base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.as_converter().base.log_format
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_converter().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_converter().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_converter().database_url.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_converter().max_upload_size_bytes
    }

    pub fn conversion_max_dimension(&self) -> u32 {
        self.as_converter().conversion_max_dimension
    }

    pub fn pdf_render_dpi(&self) -> u32 {
        self.as_converter().pdf_render_dpi
    }

    pub fn pdfium_lib_path(&self) -> Option<&str> {
        self.as_converter().pdfium_lib_path.as_deref()
    }

    pub fn job_queue_max_workers(&self) -> usize {
        self.as_converter().job_queue_max_workers
    }

    pub fn job_queue_poll_interval_ms(&self) -> u64 {
        self.as_converter().job_queue_poll_interval_ms
    }

    pub fn job_max_attempts(&self) -> u32 {
        self.as_converter().job_max_attempts
    }

    pub fn job_retry_base_delay_ms(&self) -> u64 {
        self.as_converter().job_retry_base_delay_ms
    }

    pub fn job_retry_max_backoff_secs(&self) -> u64 {
        self.as_converter().job_retry_max_backoff_secs
    }

    pub fn job_timeout_secs(&self) -> u64 {
        self.as_converter().job_timeout_secs
    }

    pub fn job_visibility_timeout_secs(&self) -> u64 {
        self.as_converter().job_visibility_timeout_secs
    }

    pub fn job_reap_interval_secs(&self) -> u64 {
        self.as_converter().job_reap_interval_secs
    }
}

impl MediaConverterConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_UPLOAD_SIZE_MB: usize = 50;
        const CONVERSION_MAX_DIMENSION: u32 = 3500;
        const PDF_RENDER_DPI: u32 = 300;
        const JOB_QUEUE_MAX_WORKERS: usize = 4;
        const JOB_QUEUE_POLL_INTERVAL_MS: u64 = 1000;
        const JOB_MAX_ATTEMPTS: u32 = 3;
        const JOB_RETRY_BASE_DELAY_MS: u64 = 1000;
        const JOB_RETRY_MAX_BACKOFF_SECS: u64 = 600;
        const JOB_TIMEOUT_SECS: u64 = 600;
        const JOB_VISIBILITY_TIMEOUT_SECS: u64 = 900;
        const JOB_REAP_INTERVAL_SECS: u64 = 60;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let log_format_raw = env::var("LOG_FORMAT").unwrap_or_default();
        let log_format = LogFormat::parse(&log_format_raw).ok_or_else(|| {
            anyhow::anyhow!(
                "LOG_FORMAT must be 'compact' or 'json', got '{}'",
                log_format_raw
            )
        })?;

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            log_format,
        };

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        Ok(Self {
            base,
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            max_upload_size_bytes: upload_limit_bytes(max_upload_size_mb)?,
            conversion_max_dimension: env::var("CONVERSION_MAX_DIMENSION")
                .unwrap_or_else(|_| CONVERSION_MAX_DIMENSION.to_string())
                .parse()
                .unwrap_or(CONVERSION_MAX_DIMENSION),
            pdf_render_dpi: env::var("PDF_RENDER_DPI")
                .unwrap_or_else(|_| PDF_RENDER_DPI.to_string())
                .parse()
                .unwrap_or(PDF_RENDER_DPI),
            pdfium_lib_path: env::var("PDFIUM_LIB_PATH").ok(),
            job_queue_max_workers: env::var("JOB_QUEUE_MAX_WORKERS")
                .unwrap_or_else(|_| JOB_QUEUE_MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(JOB_QUEUE_MAX_WORKERS),
            job_queue_poll_interval_ms: env::var("JOB_QUEUE_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| JOB_QUEUE_POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(JOB_QUEUE_POLL_INTERVAL_MS),
            job_max_attempts: env::var("JOB_MAX_ATTEMPTS")
                .unwrap_or_else(|_| JOB_MAX_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(JOB_MAX_ATTEMPTS),
            job_retry_base_delay_ms: env::var("JOB_RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| JOB_RETRY_BASE_DELAY_MS.to_string())
                .parse()
                .unwrap_or(JOB_RETRY_BASE_DELAY_MS),
            job_retry_max_backoff_secs: env::var("JOB_RETRY_MAX_BACKOFF_SECS")
                .unwrap_or_else(|_| JOB_RETRY_MAX_BACKOFF_SECS.to_string())
                .parse()
                .unwrap_or(JOB_RETRY_MAX_BACKOFF_SECS),
            job_timeout_secs: env::var("JOB_TIMEOUT_SECS")
                .unwrap_or_else(|_| JOB_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(JOB_TIMEOUT_SECS),
            job_visibility_timeout_secs: env::var("JOB_VISIBILITY_TIMEOUT_SECS")
                .unwrap_or_else(|_| JOB_VISIBILITY_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(JOB_VISIBILITY_TIMEOUT_SECS),
            job_reap_interval_secs: env::var("JOB_REAP_INTERVAL_SECS")
                .unwrap_or_else(|_| JOB_REAP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(JOB_REAP_INTERVAL_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.conversion_max_dimension == 0 {
            return Err(anyhow::anyhow!(
                "CONVERSION_MAX_DIMENSION must be greater than 0"
            ));
        }

        if self.pdf_render_dpi == 0 {
            return Err(anyhow::anyhow!("PDF_RENDER_DPI must be greater than 0"));
        }

        if self.job_queue_max_workers == 0 {
            return Err(anyhow::anyhow!(
                "JOB_QUEUE_MAX_WORKERS must be at least 1"
            ));
        }

        if self.job_max_attempts == 0 {
            return Err(anyhow::anyhow!("JOB_MAX_ATTEMPTS must be at least 1"));
        }

        if self.job_retry_max_backoff_secs > MAX_RETRY_BACKOFF_SECS {
            return Err(anyhow::anyhow!(
                "JOB_RETRY_MAX_BACKOFF_SECS ({}) must be at most {}",
                self.job_retry_max_backoff_secs,
                MAX_RETRY_BACKOFF_SECS
            ));
        }

        if self.job_timeout_secs == 0 {
            return Err(anyhow::anyhow!("JOB_TIMEOUT_SECS must be greater than 0"));
        }

        // A claim must outlive the attempt that holds it, otherwise the reaper
        // hands live work to a second worker.
        if self.job_visibility_timeout_secs <= self.job_timeout_secs {
            return Err(anyhow::anyhow!(
                "JOB_VISIBILITY_TIMEOUT_SECS ({}) must be greater than JOB_TIMEOUT_SECS ({})",
                self.job_visibility_timeout_secs,
                self.job_timeout_secs
            ));
        }

        Ok(())
    }
}
