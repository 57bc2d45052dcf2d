//! Photo transform layer.
//!
//! This module turns a stored photo plus a named size into the bytes served
//! to clients, caching the expensive results.
//!
//! # Architecture
//!
//! The photo service sits between the HTTP layer and the raw photo store:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              PhotoService               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │TransformCache│  │PhotoTransformer │  │
//! │  │  (encoded    │  │ (decode → rotate│  │
//! │  │   JPEGs)     │  │  → size → JPEG) │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               PhotoStore                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`PhotoService`]: Main entry point, orchestrates the full pipeline
//! - [`TransformCache`]: Bounded cache with use-count eviction
//! - [`CacheKey`]: Composite key (path, rotation, modified time, size)
//! - [`PhotoTransformer`]: Rotation, reduction, bounding-box fit and JPEG encoding
//! - [`TransformSpec`] / [`lookup`]: Size label catalog
//!
//! # Size labels
//!
//! | label | transform |
//! |---|---|
//! | `full`, `half`, `quarter`, `eighth` | reduce by 1, 2, 4, 8 |
//! | `xsmall`, `small`, `medium` | fit 80², 160², 320² |
//! | `large`, `xlarge`, `xxlarge` | fit 640×480, 800×600, 1024×768 |
//! | `xxxlarge`, `xxxxlarge` | fit 1280×1024, 1600×1200 |
//! | `tivo`, `blog`, `home` | fit 320², 852², 990² |
//! | anything else / none | stored bytes, unmodified |

mod cache;
mod catalog;
mod service;
mod transformer;

pub use cache::{CacheKey, TransformCache, DEFAULT_CACHE_MAX_COUNT};
pub use catalog::{lookup, TransformSpec, SIZE_LABELS};
pub use service::{PhotoIdentity, PhotoResponse, PhotoService};
pub use transformer::{
    fit_dimensions, reduce, rotate_expand, swaps_axes, PhotoTransformer, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
