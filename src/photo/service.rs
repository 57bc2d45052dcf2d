//! Photo Service for resolving photos at a requested size.
//!
//! The PhotoService is the main entry point for photo requests. It orchestrates:
//! - Cache lookups
//! - Size label resolution
//! - Raw byte reads from storage
//! - Rotation, resizing and JPEG encoding
//! - Result caching
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         PhotoService                            │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                     resolve()                           │    │
//! │  │  1. Build cache key     4. Read raw bytes               │    │
//! │  │  2. Check cache         5. Transform (blocking pool)    │    │
//! │  │  3. Look up size label  6. Cache & return               │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │        │              │               │                │        │
//! │        ▼              ▼               ▼                ▼        │
//! │ ┌────────────┐ ┌────────────┐ ┌──────────────┐ ┌──────────────┐ │
//! │ │ Transform  │ │  catalog   │ │  PhotoStore  │ │    Photo     │ │
//! │ │   Cache    │ │  lookup    │ │              │ │ Transformer  │ │
//! │ └────────────┘ └────────────┘ └──────────────┘ └──────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::error::PhotoError;
use crate::store::PhotoStore;

use super::cache::{CacheKey, TransformCache};
use super::catalog;
use super::transformer::PhotoTransformer;

// =============================================================================
// Photo Identity
// =============================================================================

/// The stored facts about a photo that determine its rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoIdentity {
    /// Path of the source file relative to the store root
    pub path: String,

    /// Rotation in degrees
    pub rotation: i32,

    /// Modification timestamp; changes when the photo is re-uploaded
    pub modified: i64,
}

impl PhotoIdentity {
    /// Create a new photo identity.
    pub fn new(path: impl Into<String>, rotation: i32, modified: i64) -> Self {
        Self {
            path: path.into(),
            rotation,
            modified,
        }
    }

    /// Cache key for this photo at `size`.
    pub fn cache_key(&self, size: Option<&str>) -> CacheKey {
        CacheKey::new(self.path.as_str(), self.rotation, self.modified, size)
    }
}

// =============================================================================
// Photo Response
// =============================================================================

/// Response from the photo service.
#[derive(Debug, Clone)]
pub struct PhotoResponse {
    /// Bytes to serve
    pub data: Bytes,

    /// Whether the bytes came from the cache
    pub cache_hit: bool,

    /// Whether the bytes were produced by a transform (false for passthrough)
    pub transformed: bool,
}

// =============================================================================
// Photo Service
// =============================================================================

/// Service for transforming and caching photos.
///
/// # Type Parameters
///
/// * `S` - The raw photo store
///
/// # Example
///
/// ```ignore
/// use photo_thumbs::photo::{PhotoIdentity, PhotoService};
/// use photo_thumbs::store::LocalPhotoStore;
///
/// let service = PhotoService::new(LocalPhotoStore::new("/mnt/photos/"));
///
/// let photo = PhotoIdentity::new("2024/beach.jpg", 90, 1_700_000_000);
/// let response = service.resolve(&photo, Some("small")).await?;
///
/// println!("{} bytes, cache hit: {}", response.data.len(), response.cache_hit);
/// ```
pub struct PhotoService<S: PhotoStore> {
    /// Raw photo bytes
    store: Arc<S>,

    /// Cache for transformed photos
    cache: TransformCache,

    /// Rotation/resize/encode
    transformer: PhotoTransformer,
}

impl<S: PhotoStore> PhotoService<S> {
    /// Create a new photo service with default cache and encoder settings.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            cache: TransformCache::new(),
            transformer: PhotoTransformer::new(),
        }
    }

    /// Create a new photo service with a custom cache size.
    ///
    /// # Arguments
    ///
    /// * `store` - The raw photo store
    /// * `max_count` - Maximum number of cached photos
    pub fn with_cache_max_count(store: S, max_count: usize) -> Self {
        Self {
            store: Arc::new(store),
            cache: TransformCache::with_max_count(max_count),
            transformer: PhotoTransformer::new(),
        }
    }

    /// Replace the transformer (e.g. to change JPEG quality).
    pub fn with_transformer(mut self, transformer: PhotoTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    /// Resolve a photo at the requested size.
    ///
    /// 1. Checks the cache for the photo/size key
    /// 2. Looks up the size label
    /// 3. For an unrecognized or missing label, returns the stored bytes as-is
    ///    (uncached, and without applying rotation)
    /// 4. Otherwise reads, transforms, caches and returns the result
    ///
    /// # Errors
    ///
    /// - [`PhotoError::StorageUnavailable`] if the raw bytes cannot be read
    /// - [`PhotoError::DecodeFailure`] if the raw bytes are not an image
    /// - [`PhotoError::EmptyOutput`] / [`PhotoError::EncodeFailure`] from the transform
    /// - [`PhotoError::TransformAborted`] if the transform task panicked
    pub async fn resolve(
        &self,
        photo: &PhotoIdentity,
        size: Option<&str>,
    ) -> Result<PhotoResponse, PhotoError> {
        let cache_key = photo.cache_key(size);

        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!(path = %photo.path, size = ?size, "Photo cache hit");
            return Ok(PhotoResponse {
                data: cached,
                cache_hit: true,
                transformed: true,
            });
        }

        let spec = catalog::lookup(size);

        if spec.is_identity() {
            debug!(path = %photo.path, size = ?size, "Serving stored photo unmodified");
            let raw = self.store.read(&photo.path).await?;
            return Ok(PhotoResponse {
                data: raw,
                cache_hit: false,
                transformed: false,
            });
        }

        debug!(path = %photo.path, size = ?size, ?spec, "Photo cache miss, transforming");
        let raw = self.store.read(&photo.path).await?;

        let transformer = self.transformer;
        let rotation = photo.rotation;
        let data = tokio::task::spawn_blocking(move || transformer.apply(&raw, rotation, spec))
            .await
            .map_err(|e| PhotoError::TransformAborted {
                message: e.to_string(),
            })??;

        self.cache.put(cache_key, data.clone()).await;

        Ok(PhotoResponse {
            data,
            cache_hit: false,
            transformed: true,
        })
    }

    /// Get cache statistics.
    ///
    /// Returns `(entry_count, max_count)`.
    pub async fn cache_stats(&self) -> (usize, usize) {
        (self.cache.len().await, self.cache.max_count())
    }

    /// Clear the transform cache.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Get a reference to the transform cache.
    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }
}

// =============================================================================
// Tests
// =============================================================================
