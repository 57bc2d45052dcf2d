//! Router configuration for the photo thumbnail server.
//!
//! # Route Structure
//!
//! ```text
//! /health                              - Health check
//! {root_context}id/{id}/size/{label}   - Photo endpoint (any other path
//!                                        answers 404 from the same handler)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use photo_thumbs::photo::PhotoService;
//! use photo_thumbs::server::{create_router, RouterConfig};
//! use photo_thumbs::store::{LocalPhotoStore, MySqlPhotoMetadata};
//!
//! let metadata = MySqlPhotoMetadata::connect_lazy(&settings);
//! let service = PhotoService::new(LocalPhotoStore::new("/mnt/photos/"));
//!
//! let router = create_router(Arc::new(metadata), Arc::new(service), RouterConfig::default());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, photo_handler, AppState};
use crate::config::DEFAULT_ROOT_CONTEXT;
use crate::photo::PhotoService;
use crate::store::{PhotoMetadata, PhotoStore};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Path prefix photo requests must start with
    pub root_context: String,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration serving photos under `root_context`.
    pub fn new(root_context: impl Into<String>) -> Self {
        Self {
            root_context: root_context.into(),
            enable_tracing: true,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_CONTEXT)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Every GET outside `/health` goes to the photo handler, which answers 404
/// for paths outside the root context. Other methods get 405.
pub fn create_router<M, S>(
    metadata: Arc<M>,
    photo_service: Arc<PhotoService<S>>,
    config: RouterConfig,
) -> Router
where
    M: PhotoMetadata + 'static,
    S: PhotoStore + 'static,
{
    let app_state = AppState::new(metadata, photo_service, config.root_context);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/", get(photo_handler::<M, S>))
        .route("/{*path}", get(photo_handler::<M, S>))
        .with_state(app_state);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
