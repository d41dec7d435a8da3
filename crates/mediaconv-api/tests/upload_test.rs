//! Upload and background conversion integration tests.
//!
//! Run with: `cargo test -p mediaconv-api --test upload_test`

mod helpers;

use helpers::{decode_base64, setup_test_app, setup_test_app_without_workers};
use mediaconv_core::JobStatus;
use mediaconv_processing::testing::{encrypted_pdf_bytes, jpeg_bytes, pdf_bytes, png_bytes};
use serde_json::Value;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[tokio::test]
async fn test_upload_returns_created_list() {
    let app = setup_test_app().await;

    let response = app.upload("PNG", "red.png", png_bytes(8, 8)).await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    let entries = body.as_array().expect("list body");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["file_name"], "red.png");
    assert_eq!(entries[0]["file_type"], "PNG");
    assert!(entries[0]["id"].is_string());
}

#[tokio::test]
async fn test_png_within_bounds_is_stored_unchanged() {
    let mut app = setup_test_app().await;
    let original = png_bytes(16, 9);
    let id = app.upload_ok("PNG", "small.png", original.clone()).await;

    let job = app.next_finished_job().await;
    assert_eq!(job.media_id, id);
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.attempt, 0);

    let body: Value = app.download("processed", id, Some("-1")).await.json();
    assert_eq!(body["processed_total_count"], 1);
    assert_eq!(body["processed_count"], 1);
    assert_eq!(decode_base64(&body["processed_files"][0]), original);
}

#[tokio::test]
async fn test_jpeg_is_converted_to_png() {
    let mut app = setup_test_app().await;
    let id = app.upload_ok("JPG", "photo.jpg", jpeg_bytes(20, 10)).await;
    assert_eq!(app.next_finished_job().await.status, JobStatus::Succeeded);

    let body: Value = app.download("processed", id, None).await.json();
    let variant = decode_base64(&body["processed_files"][0]);
    assert_eq!(&variant[..8], &PNG_SIGNATURE);
    assert_eq!(body["file_type"], "JPG");
}

#[tokio::test]
async fn test_pdf_yields_one_variant_per_page() {
    let mut app = setup_test_app().await;
    let id = app.upload_ok("PDF", "doc.pdf", pdf_bytes(3, 60.0, 40.0)).await;
    assert_eq!(app.next_finished_job().await.status, JobStatus::Succeeded);

    let body: Value = app.download("processed", id, Some("-1")).await.json();
    assert_eq!(body["processed_total_count"], 3);
    let pages = body["processed_files"].as_array().unwrap();
    assert_eq!(pages.len(), 3);
    for page in pages {
        assert_eq!(&decode_base64(page)[..8], &PNG_SIGNATURE);
    }
}

#[tokio::test]
async fn test_type_mismatch_is_rejected_before_storage() {
    let app = setup_test_app().await;

    let response = app.upload("PNG", "photo.jpg", jpeg_bytes(4, 4)).await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "TYPE_MISMATCH");

    assert_eq!(app.state.job_queue.outstanding().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unrecognised_bytes_are_unsupported() {
    let app = setup_test_app().await;

    let response = app
        .upload("PDF", "notes.txt", b"just some text".to_vec())
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn test_unknown_declared_type_is_unsupported() {
    let app = setup_test_app().await;

    let response = app.upload("GIF", "anim.gif", png_bytes(2, 2)).await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = setup_test_app().await;

    let too_big = vec![0u8; helpers::MAX_UPLOAD_SIZE_BYTES + 1];
    let response = app.upload("PNG", "huge.png", too_big).await;
    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_unconvertible_pdf_ends_terminal_without_variants() {
    let mut app = setup_test_app().await;
    let id = app
        .upload_ok("PDF", "locked.pdf", encrypted_pdf_bytes())
        .await;

    let job = app.next_finished_job().await;
    assert_eq!(job.media_id, id);
    assert_eq!(job.status, JobStatus::FailedTerminal);
    assert_eq!(job.attempt, 3);
    assert!(job.last_error.is_some());

    let body: Value = app.download("processed", id, Some("-1")).await.json();
    assert_eq!(body["processed_total_count"], 0);
    assert_eq!(body["processed_files"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_duplicate_submissions_store_one_complete_run() {
    let mut app = setup_test_app_without_workers();
    let id = app.upload_ok("PDF", "doc.pdf", pdf_bytes(2, 30.0, 30.0)).await;
    app.state.job_queue.enqueue(id).await.unwrap();
    app.state.job_queue.enqueue(id).await.unwrap();
    app.start_workers();

    for _ in 0..3 {
        assert_eq!(app.next_finished_job().await.status, JobStatus::Succeeded);
    }

    let body: Value = app.download("processed", id, None).await.json();
    assert_eq!(body["processed_total_count"], 2);
}

#[tokio::test]
async fn test_deleted_media_job_ends_terminal_without_retry() {
    let mut app = setup_test_app_without_workers();
    let id = app.upload_ok("PNG", "gone.png", png_bytes(4, 4)).await;

    let response = app.client().delete(&format!("/media/{}", id)).await;
    assert_eq!(response.status_code(), 204);

    app.start_workers();
    let job = app.next_finished_job().await;
    assert_eq!(job.media_id, id);
    assert_eq!(job.status, JobStatus::FailedTerminal);
    assert_eq!(job.attempt, 1);
}
