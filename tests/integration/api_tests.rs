//! API integration tests for photo retrieval and error handling.
//!
//! Tests verify:
//! - Photo retrieval at named sizes, with and without rotation
//! - Error cases (bad prefix, missing id, unknown photo, pool exhaustion, corrupt file)
//! - HTTP response codes and headers

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use std::sync::atomic::Ordering;
use tower::ServiceExt;

use photo_thumbs::error::MetadataError;

use super::test_utils::{
    body_bytes, build_router, create_test_jpeg, get, is_valid_jpeg, jpeg_dimensions,
    MockMetadata, MockStore,
};

fn single_photo(width: u32, height: u32, rotation: i32) -> (MockMetadata, MockStore, Vec<u8>) {
    let jpeg = create_test_jpeg(width, height);
    let metadata = MockMetadata::new().with_photo("1", "2024/photo.jpg", rotation, 1_700_000_000);
    let store = MockStore::new().with_file("2024/photo.jpg", jpeg.clone());
    (metadata, store, jpeg)
}

// =============================================================================
// Basic Photo Retrieval
// =============================================================================

#[tokio::test]
async fn test_full_size_keeps_dimensions() {
    let (metadata, store, _) = single_photo(1000, 2000, 0);
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/1/size/full").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert!(is_valid_jpeg(&body));
    assert_eq!(jpeg_dimensions(&body), (1000, 2000));
}

#[tokio::test]
async fn test_small_fits_bounding_box() {
    let (metadata, store, _) = single_photo(1000, 2000, 0);
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/1/size/small").await;
    assert_eq!(response.status(), StatusCode::OK);

    // ratio = max(1000/160, 2000/160) = 12.5
    let body = body_bytes(response).await;
    assert_eq!(jpeg_dimensions(&body), (80, 160));
}

#[tokio::test]
async fn test_response_headers() {
    let (metadata, store, _) = single_photo(200, 100, 0);
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/1/size/half").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    assert_eq!(
        response.headers().get("x-photo-cache-hit").unwrap(),
        "false"
    );

    let content_length: usize = response
        .headers()
        .get("content-length")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let body = body_bytes(response).await;
    assert_eq!(content_length, body.len());
    assert_eq!(jpeg_dimensions(&body), (100, 50));
}

#[tokio::test]
async fn test_no_size_returns_stored_bytes_without_rotation() {
    let (metadata, store, jpeg) = single_photo(1000, 2000, 90);
    let (router, service) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert_eq!(&body[..], &jpeg[..]);
    assert_eq!(jpeg_dimensions(&body), (1000, 2000));

    let (entries, _) = service.cache_stats().await;
    assert_eq!(entries, 0);
}

#[tokio::test]
async fn test_unknown_size_returns_stored_bytes() {
    let (metadata, store, jpeg) = single_photo(64, 32, 0);
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/1/size/gigantic").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], &jpeg[..]);
}

#[tokio::test]
async fn test_rotation_applied_for_named_size() {
    let (metadata, store, _) = single_photo(100, 200, 90);
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/1/size/half").await;
    assert_eq!(response.status(), StatusCode::OK);

    // Rotated canvas is 200x100, halved
    let body = body_bytes(response).await;
    assert_eq!(jpeg_dimensions(&body), (100, 50));
}

#[tokio::test]
async fn test_key_order_and_query_string_ignored() {
    let (metadata, store, _) = single_photo(1000, 2000, 0);
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/size/small/id/1?download=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(jpeg_dimensions(&body_bytes(response).await), (80, 160));
}

#[tokio::test]
async fn test_dangling_segment_ignored() {
    let (metadata, store, _) = single_photo(200, 100, 0);
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/1/size/half/extra").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(jpeg_dimensions(&body_bytes(response).await), (100, 50));
}

// =============================================================================
// Not Found
// =============================================================================

#[tokio::test]
async fn test_not_found_cases() {
    let (metadata, store, _) = single_photo(16, 16, 0);
    let lookups = metadata.lookup_counter();
    let (router, _) = build_router(metadata, store, 32);

    for uri in [
        "/",
        "/other/id/1",
        "/photos/photo",
        "/photos/photo/",
        "/photos/photo/id",
        "/photos/photo/id//size/small",
        "/photos/photo/size/small",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {}", uri);
    }

    // None of those reached the database
    assert_eq!(lookups.load(Ordering::SeqCst), 0);

    let response = get(&router, "/photos/photo/id/999/size/small").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(lookups.load(Ordering::SeqCst), 1);

    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
}

// =============================================================================
// Server Errors
// =============================================================================

#[tokio::test]
async fn test_pool_exhausted_is_503() {
    let metadata =
        MockMetadata::failing(MetadataError::PoolExhausted("pool timed out".to_string()));
    let store = MockStore::new();
    let reads = store.read_counter();
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/1/size/small").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reads.load(Ordering::SeqCst), 0);

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"], "pool_exhausted");
}

#[tokio::test]
async fn test_metadata_query_failure_is_500() {
    let metadata = MockMetadata::failing(MetadataError::Query("no such table".to_string()));
    let (router, _) = build_router(metadata, MockStore::new(), 32);

    let response = get(&router, "/photos/photo/id/1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_corrupt_photo_does_not_affect_other_requests() {
    let metadata = MockMetadata::new()
        .with_photo("bad", "bad.jpg", 0, 1)
        .with_photo("good", "good.jpg", 0, 1);
    let store = MockStore::new()
        .with_file("bad.jpg", b"definitely not an image".to_vec())
        .with_file("good.jpg", create_test_jpeg(320, 160));
    let (router, service) = build_router(metadata, store, 32);

    let (bad, good) = tokio::join!(
        get(&router, "/photos/photo/id/bad/size/small"),
        get(&router, "/photos/photo/id/good/size/small"),
    );

    assert_eq!(bad.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(bad).await).unwrap();
    assert_eq!(json["error"], "decode_error");

    assert_eq!(good.status(), StatusCode::OK);
    assert_eq!(jpeg_dimensions(&body_bytes(good).await), (160, 80));

    // The failure is not cached
    let (entries, _) = service.cache_stats().await;
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn test_corrupt_photo_served_raw_without_size() {
    let metadata = MockMetadata::new().with_photo("bad", "bad.jpg", 0, 1);
    let store = MockStore::new().with_file("bad.jpg", b"not an image".to_vec());
    let (router, _) = build_router(metadata, store, 32);

    let response = get(&router, "/photos/photo/id/bad").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"not an image");
}

#[tokio::test]
async fn test_missing_file_is_500() {
    let metadata = MockMetadata::new().with_photo("1", "gone.jpg", 0, 1);
    let (router, _) = build_router(metadata, MockStore::new(), 32);

    let response = get(&router, "/photos/photo/id/1/size/small").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"], "storage_error");
}

// =============================================================================
// Other Endpoints
// =============================================================================

#[tokio::test]
async fn test_non_get_method_not_allowed() {
    let (metadata, store, _) = single_photo(16, 16, 0);
    let (router, _) = build_router(metadata, store, 32);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/photos/photo/id/1")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (router, _) = build_router(MockMetadata::new(), MockStore::new(), 32);

    let response = get(&router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}
