//! Test helpers: build AppState and router for integration tests.
//!
//! The app runs on in-memory stores with a live worker pool. PDF pages are rendered by
//! `MediaBoxRenderer`, so no pdfium library is needed.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mediaconv_api::setup::database::Stores;
use mediaconv_api::setup::{routes, services};
use mediaconv_api::AppState;
use mediaconv_core::{BaseConfig, Config, ConversionJob, LogFormat, MediaConverterConfig};
use mediaconv_processing::testing::MediaBoxRenderer;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const MAX_UPLOAD_SIZE_BYTES: usize = 256 * 1024;

pub fn create_test_config() -> Config {
    Config(Box::new(MediaConverterConfig {
        base: BaseConfig {
            server_port: 0,
            db_max_connections: 1,
            db_timeout_seconds: 5,
            environment: "test".to_string(),
            log_format: LogFormat::Compact,
        },
        database_url: None,
        max_upload_size_bytes: MAX_UPLOAD_SIZE_BYTES,
        conversion_max_dimension: 3500,
        pdf_render_dpi: 72,
        pdfium_lib_path: None,
        job_queue_max_workers: 2,
        job_queue_poll_interval_ms: 10,
        job_max_attempts: 3,
        job_retry_base_delay_ms: 1,
        job_retry_max_backoff_secs: 1,
        job_timeout_secs: 30,
        job_visibility_timeout_secs: 60,
        job_reap_interval_secs: 0,
    }))
}

/// Test application: server, state, and the job-finished channel.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    finished_tx: Option<mpsc::Sender<ConversionJob>>,
    finished_rx: mpsc::Receiver<ConversionJob>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Start the worker pool. Idempotent.
    pub fn start_workers(&mut self) {
        if let Some(tx) = self.finished_tx.take() {
            services::start_job_workers(&self.state, Some(tx));
        }
    }

    /// Next job to reach `Succeeded` or `FailedTerminal`.
    pub async fn next_finished_job(&mut self) -> ConversionJob {
        tokio::time::timeout(Duration::from_secs(10), self.finished_rx.recv())
            .await
            .expect("no conversion job finished in time")
            .expect("job finished channel closed")
    }

    pub async fn upload(&self, file_type: &str, file_name: &str, bytes: Vec<u8>) -> TestResponse {
        let form = MultipartForm::new().add_part("file", Part::bytes(bytes).file_name(file_name));
        self.server
            .post("/upload")
            .add_query_param("file_type", file_type)
            .multipart(form)
            .await
    }

    /// Upload and return the new media id, asserting a 201.
    pub async fn upload_ok(&self, file_type: &str, file_name: &str, bytes: Vec<u8>) -> Uuid {
        let response = self.upload(file_type, file_name, bytes).await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        let body: Value = response.json();
        let id = body[0]["id"].as_str().expect("id in upload response");
        Uuid::parse_str(id).expect("uuid id")
    }

    pub async fn download(&self, source: &str, id: Uuid, idx: Option<&str>) -> TestResponse {
        let request = self.server.get(&format!("/download/{}/{}", source, id));
        match idx {
            Some(idx) => request.add_query_param("idx", idx).await,
            None => request.await,
        }
    }
}

/// Setup the test app. Workers start immediately.
pub async fn setup_test_app() -> TestApp {
    let mut app = setup_test_app_without_workers();
    app.start_workers();
    app
}

/// Setup the test app with the worker pool stopped, so queued jobs stay pending.
pub fn setup_test_app_without_workers() -> TestApp {
    setup_test_app_with_stores(Stores::in_memory())
}

/// Setup the test app over caller-supplied stores, workers stopped.
pub fn setup_test_app_with_stores(stores: Stores) -> TestApp {
    let config = create_test_config();
    let state = services::build_app_state(&config, stores, Arc::new(MediaBoxRenderer));
    let router = routes::setup_routes(&config, state.clone());
    let server = TestServer::new(router).expect("Failed to create test server");
    let (finished_tx, finished_rx) = mpsc::channel(16);

    TestApp {
        server,
        state,
        finished_tx: Some(finished_tx),
        finished_rx,
    }
}

pub fn decode_base64(value: &Value) -> Vec<u8> {
    STANDARD
        .decode(value.as_str().expect("base64 string"))
        .expect("valid base64")
}
