//! Filesystem-backed photo store.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use crate::error::StorageError;

use super::PhotoStore;

/// Default mount point for stored photos.
pub const DEFAULT_PHOTO_ROOT: &str = "/mnt/photos/";

/// Reads photos from a fixed root directory.
///
/// Paths from the metadata database are appended to the root; a leading `/`
/// stays inside it. `..` components are rejected so a record cannot reach
/// outside the mount.
#[derive(Debug, Clone)]
pub struct LocalPhotoStore {
    root: PathBuf,
}

impl LocalPhotoStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.as_os_str().is_empty() || escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn read(&self, path: &str) -> Result<Bytes, StorageError> {
        let full_path = self.resolve(path)?;
        debug!("Reading photo from {:?}", full_path);

        match fs::read(&full_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(StorageError::Io(format!("{}: {}", path, e))),
        }
    }
}
