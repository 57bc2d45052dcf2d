//! Collaborators that sit outside the transform pipeline.
//!
//! ```text
//! ┌───────────────────────┐        ┌──────────────────────┐
//! │     HTTP Handlers     │───────▶│   PhotoMetadata      │  id → path, rotation, mtime
//! └───────────┬───────────┘        │ (MySQL, pooled)      │
//!             │                    └──────────────────────┘
//!             ▼
//! ┌───────────────────────┐        ┌──────────────────────┐
//! │     PhotoService      │───────▶│   PhotoStore         │  path → raw bytes
//! └───────────────────────┘        │ (local mount)        │
//!                                  └──────────────────────┘
//! ```
//!
//! Both are traits so the service and handlers can be exercised against
//! in-memory implementations.

mod local;
mod metadata;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

pub use local::{LocalPhotoStore, DEFAULT_PHOTO_ROOT};
pub use metadata::{MySqlPhotoMetadata, PhotoMetadata, PoolSettings};

/// Source of raw photo bytes.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Read the complete stored file for `path`.
    ///
    /// # Arguments
    /// * `path` - Path of the photo relative to the store's root
    async fn read(&self, path: &str) -> Result<Bytes, StorageError>;
}
