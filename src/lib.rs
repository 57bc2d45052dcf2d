//! # Photo Thumbs
//!
//! An HTTP server that delivers stored photos at named sizes.
//!
//! A request names a photo by id and optionally a size label (`small`,
//! `half`, `xlarge`, ...). The photo's path, rotation and modification time
//! come from a MySQL/MariaDB table; the file is read from a local mount,
//! rotated, resized and re-encoded as JPEG. Encoded results are kept in a
//! bounded in-memory cache keyed on the photo identity and size, so a
//! re-uploaded photo (new modification time) is transformed again
//! automatically.
//!
//! ## Features
//!
//! - **Named sizes**: Power-of-two reductions and bounding-box fits
//! - **Rotation**: Arbitrary angles, canvas expanded to fit
//! - **Frequency-based caching**: Popular photo/size pairs stay in memory
//! - **Bounded database pool**: Connections are released before any image work
//!
//! ## Architecture
//!
//! - [`photo`] - Size catalog, transformer, cache and the orchestrating service
//! - [`store`] - Raw photo storage and metadata lookup
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use clap::Parser;
//! use photo_thumbs::{
//!     create_router, Config, LocalPhotoStore, MySqlPhotoMetadata, PhotoService, RouterConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = Config::parse();
//!
//!     let metadata = MySqlPhotoMetadata::connect_lazy(&config.pool_settings());
//!     let service = PhotoService::with_cache_max_count(
//!         LocalPhotoStore::new(&config.photo_root),
//!         config.lfu_cache_max_count,
//!     );
//!
//!     let router = create_router(
//!         Arc::new(metadata),
//!         Arc::new(service),
//!         RouterConfig::new(&config.root_context),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//!     axum::serve(listener, router).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod photo;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{MetadataError, PhotoError, StorageError};
pub use photo::{
    lookup, CacheKey, PhotoIdentity, PhotoResponse, PhotoService, PhotoTransformer,
    TransformCache, TransformSpec, DEFAULT_CACHE_MAX_COUNT, DEFAULT_JPEG_QUALITY,
};
pub use server::{
    create_router, health_handler, photo_handler, AppState, ErrorResponse, HandlerError,
    HealthResponse, PhotoPathParams, RouterConfig,
};
pub use store::{
    LocalPhotoStore, MySqlPhotoMetadata, PhotoMetadata, PhotoStore, PoolSettings,
    DEFAULT_PHOTO_ROOT,
};
