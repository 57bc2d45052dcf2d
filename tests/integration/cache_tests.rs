//! Cache effectiveness integration tests.
//!
//! Tests verify:
//! - Transformed photos are served from the cache on repeat requests
//! - Eviction keeps the most used entries within the configured count
//! - Unmodified (no size) responses never enter the cache
//! - A new modification time produces a fresh transform

use std::sync::atomic::Ordering;

use axum::http::StatusCode;

use photo_thumbs::photo::PhotoIdentity;

use super::test_utils::{
    body_bytes, build_router, create_test_jpeg, get, jpeg_dimensions, MockMetadata, MockStore,
};

/// Three photos A, B and C sharing one source file.
fn three_photos() -> (MockMetadata, MockStore) {
    let metadata = MockMetadata::new()
        .with_photo("a", "a.jpg", 0, 1)
        .with_photo("b", "b.jpg", 0, 1)
        .with_photo("c", "c.jpg", 0, 1);
    let jpeg = create_test_jpeg(64, 64);
    let store = MockStore::new()
        .with_file("a.jpg", jpeg.clone())
        .with_file("b.jpg", jpeg.clone())
        .with_file("c.jpg", jpeg);
    (metadata, store)
}

fn identity(name: &str) -> PhotoIdentity {
    PhotoIdentity::new(format!("{}.jpg", name), 0, 1)
}

// =============================================================================
// Cache Hits
// =============================================================================

#[tokio::test]
async fn test_repeat_request_is_cache_hit() {
    let metadata = MockMetadata::new().with_photo("1", "p.jpg", 0, 1);
    let store = MockStore::new().with_file("p.jpg", create_test_jpeg(400, 300));
    let reads = store.read_counter();
    let (router, _) = build_router(metadata, store, 32);

    let first = get(&router, "/photos/photo/id/1/size/medium").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("x-photo-cache-hit").unwrap(), "false");
    let first_body = body_bytes(first).await;

    let second = get(&router, "/photos/photo/id/1/size/medium").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers().get("x-photo-cache-hit").unwrap(), "true");
    let second_body = body_bytes(second).await;

    assert_eq!(first_body, second_body);
    assert_eq!(jpeg_dimensions(&second_body), (320, 240));
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sizes_cached_independently() {
    let metadata = MockMetadata::new().with_photo("1", "p.jpg", 0, 1);
    let store = MockStore::new().with_file("p.jpg", create_test_jpeg(128, 64));
    let (router, service) = build_router(metadata, store, 32);

    for size in ["half", "quarter", "xsmall"] {
        let response = get(&router, &format!("/photos/photo/id/1/size/{}", size)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let photo = PhotoIdentity::new("p.jpg", 0, 1);
    for size in ["half", "quarter", "xsmall"] {
        assert!(service.cache().contains(&photo.cache_key(Some(size))).await);
    }
    assert_eq!(service.cache_stats().await, (3, 32));
}

#[tokio::test]
async fn test_new_modification_time_is_a_new_entry() {
    // Same file, re-uploaded: the record's timestamp moved on
    let metadata = MockMetadata::new()
        .with_photo("old", "p.jpg", 0, 100)
        .with_photo("new", "p.jpg", 0, 200);
    let store = MockStore::new().with_file("p.jpg", create_test_jpeg(64, 64));
    let reads = store.read_counter();
    let (router, service) = build_router(metadata, store, 32);

    get(&router, "/photos/photo/id/old/size/half").await;
    let response = get(&router, "/photos/photo/id/new/size/half").await;
    assert_eq!(response.headers().get("x-photo-cache-hit").unwrap(), "false");

    assert_eq!(reads.load(Ordering::SeqCst), 2);
    assert_eq!(service.cache_stats().await.0, 2);
}

#[tokio::test]
async fn test_unmodified_responses_not_cached() {
    let metadata = MockMetadata::new().with_photo("1", "p.jpg", 90, 1);
    let store = MockStore::new().with_file("p.jpg", create_test_jpeg(32, 32));
    let reads = store.read_counter();
    let (router, service) = build_router(metadata, store, 32);

    for uri in ["/photos/photo/id/1", "/photos/photo/id/1/size/unknown"] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-photo-cache-hit").unwrap(), "false");
    }
    get(&router, "/photos/photo/id/1").await;

    let photo = PhotoIdentity::new("p.jpg", 90, 1);
    assert!(!service.cache().contains(&photo.cache_key(None)).await);
    assert!(service.cache().is_empty().await);
    assert_eq!(reads.load(Ordering::SeqCst), 3);
}

// =============================================================================
// Eviction
// =============================================================================

#[tokio::test]
async fn test_third_insert_evicts_an_earlier_entry() {
    let (metadata, store) = three_photos();
    let (router, service) = build_router(metadata, store, 2);

    for id in ["a", "b", "c"] {
        let response = get(&router, &format!("/photos/photo/id/{}/size/half", id)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let cache = service.cache();
    assert_eq!(cache.len().await, 2);
    assert!(cache.contains(&identity("c").cache_key(Some("half"))).await);

    let a = cache.contains(&identity("a").cache_key(Some("half"))).await;
    let b = cache.contains(&identity("b").cache_key(Some("half"))).await;
    assert!(a ^ b, "exactly one of A and B survives");
}

#[tokio::test]
async fn test_popular_entry_survives_eviction() {
    let (metadata, store) = three_photos();
    let (router, service) = build_router(metadata, store, 2);

    for _ in 0..3 {
        get(&router, "/photos/photo/id/a/size/half").await;
    }
    get(&router, "/photos/photo/id/b/size/half").await;
    get(&router, "/photos/photo/id/c/size/half").await;

    let cache = service.cache();
    let a_key = identity("a").cache_key(Some("half"));
    assert_eq!(cache.use_count(&a_key).await, Some(3));
    assert!(cache.contains(&identity("c").cache_key(Some("half"))).await);
    assert!(!cache.contains(&identity("b").cache_key(Some("half"))).await);
}

#[tokio::test]
async fn test_zero_max_count_still_serves() {
    let (metadata, store) = three_photos();
    let (router, service) = build_router(metadata, store, 0);

    for id in ["a", "b"] {
        let response = get(&router, &format!("/photos/photo/id/{}/size/half", id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(jpeg_dimensions(&body_bytes(response).await), (32, 32));
    }

    // Only the newest entry remains
    let cache = service.cache();
    assert_eq!(cache.len().await, 1);
    assert!(cache.contains(&identity("b").cache_key(Some("half"))).await);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_cache() {
    let (metadata, store) = three_photos();
    let (router, service) = build_router(metadata, store, 32);

    let mut handles = Vec::new();
    for i in 0..12 {
        let router = router.clone();
        let id = ["a", "b", "c"][i % 3];
        handles.push(tokio::spawn(async move {
            let response = get(&router, &format!("/photos/photo/id/{}/size/xsmall", id)).await;
            response.status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(service.cache_stats().await.0, 3);
}
