//! Worker retry behaviour against the real conversion handler.
//!
//! Run with: `cargo test -p mediaconv-api --test retry_test`

mod helpers;

use async_trait::async_trait;
use bytes::Bytes;
use helpers::{decode_base64, setup_test_app_with_stores};
use mediaconv_api::setup::database::Stores;
use mediaconv_core::{FileType, JobStatus, MediaItem, NewMediaItem};
use mediaconv_db::{
    InMemoryJobStore, InMemoryMediaStore, MediaStore, StoreError, StoreResult,
};
use mediaconv_processing::testing::{jpeg_bytes, pdf_bytes};
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// In-memory media store whose first `failures` variant writes are rejected.
struct FlakyMediaStore {
    inner: InMemoryMediaStore,
    failures: u32,
    writes: AtomicU32,
}

impl FlakyMediaStore {
    fn new(failures: u32) -> Self {
        Self {
            inner: InMemoryMediaStore::new(),
            failures,
            writes: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl MediaStore for FlakyMediaStore {
    async fn create(&self, item: NewMediaItem) -> StoreResult<MediaItem> {
        self.inner.create(item).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<MediaItem>> {
        self.inner.get(id).await
    }

    async fn replace_variants(&self, id: Uuid, variants: Vec<Bytes>) -> StoreResult<()> {
        let write = self.writes.fetch_add(1, Ordering::SeqCst);
        if write < self.failures {
            return Err(StoreError::Conflict(format!("write {} rejected", write)));
        }
        self.inner.replace_variants(id, variants).await
    }

    async fn rename(&self, id: Uuid, file_name: Option<String>) -> StoreResult<MediaItem> {
        self.inner.rename(id, file_name).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete(id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

fn stores_with(media: Arc<dyn MediaStore>) -> Stores {
    Stores {
        media,
        jobs: Arc::new(InMemoryJobStore::new()),
    }
}

#[tokio::test]
async fn test_store_write_failures_are_retried_until_success() {
    let flaky = Arc::new(FlakyMediaStore::new(2));
    let mut app = setup_test_app_with_stores(stores_with(flaky.clone()));
    let id = app.upload_ok("PDF", "three.pdf", pdf_bytes(3, 50.0, 25.0)).await;
    app.start_workers();

    let job = app.next_finished_job().await;
    assert_eq!(job.media_id, id);
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.attempt, 2);
    assert_eq!(flaky.writes.load(Ordering::SeqCst), 3);

    let body: Value = app.download("processed", id, Some("-1")).await.json();
    assert_eq!(body["processed_total_count"], 3);
    let pages = body["processed_files"].as_array().unwrap();
    assert_eq!(pages.len(), 3);
    for page in pages {
        assert_eq!(&decode_base64(page)[..8], &PNG_SIGNATURE);
    }
}

#[tokio::test]
async fn test_store_write_failures_exhaust_attempts() {
    let mut app = setup_test_app_with_stores(stores_with(Arc::new(FlakyMediaStore::new(3))));
    let id = app.upload_ok("PDF", "doc.pdf", pdf_bytes(1, 50.0, 25.0)).await;
    app.start_workers();

    let job = app.next_finished_job().await;
    assert_eq!(job.status, JobStatus::FailedTerminal);
    assert_eq!(job.attempt, 3);
    assert!(job
        .last_error
        .as_deref()
        .unwrap()
        .contains("Failed to store processed variants"));

    let body: Value = app.download("processed", id, None).await.json();
    assert_eq!(body["processed_total_count"], 0);
}

#[tokio::test]
async fn test_stored_payload_failing_detection_ends_terminal_after_retries() {
    let mut app = setup_test_app_with_stores(Stores::in_memory());

    // Bypasses the submission check: JPEG bytes recorded as PNG.
    let item = app
        .state
        .media_store
        .create(NewMediaItem {
            file_name: Some("wrong.png".to_string()),
            file_type: FileType::Png,
            raw_payload: Bytes::from(jpeg_bytes(8, 8)),
        })
        .await
        .unwrap();
    app.state.job_queue.enqueue(item.id).await.unwrap();
    app.start_workers();

    let job = app.next_finished_job().await;
    assert_eq!(job.media_id, item.id);
    assert_eq!(job.status, JobStatus::FailedTerminal);
    assert_eq!(job.attempt, 3);
    assert!(job
        .last_error
        .as_deref()
        .unwrap()
        .contains("Stored payload is not a valid PNG"));

    let stored = app.state.media_store.get(item.id).await.unwrap().unwrap();
    assert!(stored.processed_variants.is_empty());
}
