//! Transform cache for encoded photos.
//!
//! This module provides a bounded cache for transformed photos, preventing
//! repeated decode/rotate/resize/encode cycles for popular sizes.
//!
//! # Cache Key
//!
//! Photos are cached by a composite key including:
//! - Storage path of the source photo
//! - Rotation in degrees
//! - Modification timestamp
//! - Requested size label (or none)
//!
//! Re-uploading a photo changes its modification timestamp and therefore its
//! key, so stale entries are never served; they simply stop being hit.
//!
//! # Count-Based Eviction
//!
//! Each entry carries a use counter that starts at 1 and grows by one on every
//! hit. When an insert pushes the cache past `max_count` entries, one entry
//! with the smallest counter (never the one just inserted) is removed.
//!
//! Counters never decay. An entry that was popular early keeps its count
//! forever, so over long uptimes old favourites can crowd out newer demand.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;

/// Default maximum number of cached photos.
pub const DEFAULT_CACHE_MAX_COUNT: usize = 32;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for transformed photos.
///
/// Used directly as the map key, so it stays stable across runs and
/// platforms without depending on a particular hash function's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Storage path of the source photo
    pub path: Arc<str>,

    /// Rotation in degrees as recorded for the photo
    pub rotation: i32,

    /// Modification timestamp of the source photo
    pub modified: i64,

    /// Requested size label, if any
    pub size: Option<Arc<str>>,
}

impl CacheKey {
    /// Create a new cache key.
    pub fn new(
        path: impl Into<Arc<str>>,
        rotation: i32,
        modified: i64,
        size: Option<&str>,
    ) -> Self {
        Self {
            path: path.into(),
            rotation,
            modified,
            size: size.map(Arc::from),
        }
    }
}

// =============================================================================
// Transform Cache
// =============================================================================

struct CacheEntry {
    payload: Bytes,
    use_count: u64,
}

/// Bounded cache for encoded photos with use-count eviction.
///
/// # Thread Safety
///
/// All state sits behind a single async mutex, so hit counting and the
/// insert-scan-evict sequence are atomic with respect to each other. Share it
/// across tasks via `Arc` (or inside a service that is itself shared).
///
/// # Example
///
/// ```
/// use photo_thumbs::photo::{CacheKey, TransformCache};
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = TransformCache::new();
///
///     let key = CacheKey::new("2024/beach.jpg", 0, 1_700_000_000, Some("small"));
///     let photo = Bytes::from(vec![0xFF, 0xD8, 0xFF, 0xE0]);
///
///     cache.put(key.clone(), photo.clone()).await;
///
///     assert_eq!(cache.get(&key).await, Some(photo));
///     assert_eq!(cache.use_count(&key).await, Some(2));
/// }
/// ```
pub struct TransformCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    max_count: usize,
}

impl TransformCache {
    /// Create a new cache holding up to [`DEFAULT_CACHE_MAX_COUNT`] photos.
    pub fn new() -> Self {
        Self::with_max_count(DEFAULT_CACHE_MAX_COUNT)
    }

    /// Create a new cache holding up to `max_count` photos.
    ///
    /// A `max_count` of 0 keeps at most the most recent insert.
    pub fn with_max_count(max_count: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_count,
        }
    }

    /// Get a photo from the cache.
    ///
    /// Returns `Some(data)` on a hit and increments the entry's use count.
    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(key)?;
        entry.use_count += 1;
        Some(entry.payload.clone())
    }

    /// Store a photo in the cache.
    ///
    /// The entry starts (or restarts, when overwriting) at a use count of 1.
    /// If the cache now holds more than `max_count` entries, one entry with
    /// the lowest use count other than `key` is evicted. Ties go to whichever
    /// candidate the scan meets first.
    pub async fn put(&self, key: CacheKey, data: Bytes) {
        let mut entries = self.entries.lock().await;

        entries.insert(
            key.clone(),
            CacheEntry {
                payload: data,
                use_count: 1,
            },
        );

        if entries.len() <= self.max_count {
            return;
        }

        let victim = entries
            .iter()
            .filter(|(candidate, _)| **candidate != key)
            .min_by_key(|(_, entry)| entry.use_count)
            .map(|(candidate, entry)| (candidate.clone(), entry.use_count));

        if let Some((victim, use_count)) = victim {
            entries.remove(&victim);
            debug!(
                path = %victim.path,
                size = ?victim.size,
                use_count,
                "Evicted cached photo"
            );
        }
    }

    /// Check if a photo is in the cache without counting a hit.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    /// Current use count of an entry, without counting a hit.
    pub async fn use_count(&self, key: &CacheKey) -> Option<u64> {
        self.entries.lock().await.get(key).map(|entry| entry.use_count)
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Get the current number of cached photos.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Get the maximum number of entries.
    pub fn max_count(&self) -> usize {
        self.max_count
    }
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
