//! Public delivery endpoint tests.

mod helpers;

use helpers::storage::UnavailableStorage;
use helpers::{setup_test_app, setup_test_app_with, TestOptions};
use std::sync::Arc;
use vigil_core::models::VideoStatus;
use vigil_db::test_helpers::video_fixture;

fn sample_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_whole_file_delivery() {
    let app = setup_test_app().await;
    let body = sample_body(10_000);
    let video = app
        .add_video(VideoStatus::Distributed, &body, "My last video!")
        .await;

    let response = app
        .server
        .get(&format!("/videos/{}", video.public_token))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "video/mp4");
    assert_eq!(response.header("content-length"), "10000");
    assert_eq!(response.header("accept-ranges"), "bytes");
    assert_eq!(
        response.header("content-disposition"),
        "inline; filename=\"My_last_video_.mp4\""
    );
    assert_eq!(response.as_bytes().as_ref(), body.as_slice());
}

#[tokio::test]
async fn test_partial_content() {
    let app = setup_test_app().await;
    let body = sample_body(10_000);
    let video = app.add_video(VideoStatus::Distributed, &body, "clip").await;
    let path = format!("/videos/{}", video.public_token);

    let response = app.server.get(&path).add_header("Range", "bytes=0-999").await;
    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 0-999/10000");
    assert_eq!(response.header("content-length"), "1000");
    assert_eq!(response.as_bytes().as_ref(), &body[..1000]);

    let response = app.server.get(&path).add_header("Range", "bytes=5000-").await;
    assert_eq!(response.status_code(), 206);
    assert_eq!(response.header("content-range"), "bytes 5000-9999/10000");
    assert_eq!(response.as_bytes().as_ref(), &body[5000..]);
}

#[tokio::test]
async fn test_unsatisfiable_range() {
    let app = setup_test_app().await;
    let video = app
        .add_video(VideoStatus::Distributed, &sample_body(10_000), "clip")
        .await;
    let path = format!("/videos/{}", video.public_token);

    for range in ["bytes=10000-10999", "bytes=500-100", "items=0-1"] {
        let response = app.server.get(&path).add_header("Range", range).await;
        assert_eq!(response.status_code(), 416, "range {}", range);
        assert_eq!(response.header("content-range"), "bytes */10000");
        let error: serde_json::Value = response.json();
        assert_eq!(error["code"], "RANGE_NOT_SATISFIABLE");
    }
}

#[tokio::test]
async fn test_undistributed_videos_are_not_found() {
    let app = setup_test_app().await;

    for status in [VideoStatus::Pending, VideoStatus::Active] {
        let video = app.add_video(status, b"secret", "clip").await;
        let response = app
            .server
            .get(&format!("/videos/{}", video.public_token))
            .await;
        assert_eq!(response.status_code(), 404);
    }

    let response = app.server.get("/videos/does-not-exist").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_expired_video_is_gone() {
    let app = setup_test_app().await;
    let video = app.add_video(VideoStatus::Expired, b"old", "clip").await;

    let response = app
        .server
        .get(&format!("/videos/{}", video.public_token))
        .await;

    assert_eq!(response.status_code(), 410);
}

#[tokio::test]
async fn test_storage_failure_before_first_byte_is_internal_error() {
    let cases: [(Option<u64>, Option<&str>); 3] = [
        (None, None),
        (Some(10_000), None),
        (Some(10_000), Some("bytes=0-999")),
    ];

    for (known_size, range) in cases {
        let app = setup_test_app_with(TestOptions {
            storage: Some(Arc::new(UnavailableStorage { known_size })),
            ..TestOptions::default()
        })
        .await;
        let video = video_fixture(app.user_id, VideoStatus::Distributed, 10_000);
        app.store.add_video(video.clone());

        let mut request = app.server.get(&format!("/videos/{}", video.public_token));
        if let Some(range) = range {
            request = request.add_header("Range", range);
        }
        let response = request.await;

        assert_eq!(response.status_code(), 500, "size {:?} range {:?}", known_size, range);
        assert!(!response.text().contains("10.0.0.7"));
        let error: serde_json::Value = response.json();
        assert_eq!(error["code"], "STORAGE_ERROR");
        assert_eq!(error["error"], "Failed to access storage");
        assert!(error.get("details").is_none());
    }
}
