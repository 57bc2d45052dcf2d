//! HTTP server layer for the photo thumbnail service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            GET {root_context}id/{id}/size/{label}               │
//! │                                                                 │
//! │  ┌──────────────────────────────┐  ┌─────────────────────────┐  │
//! │  │          handlers            │  │        routes           │  │
//! │  │ (path parsing, error mapping)│  │   (router config)       │  │
//! │  └──────────────────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, photo_handler, AppState, ErrorResponse, HandlerError, HealthResponse,
    PhotoPathParams, CACHE_HIT_HEADER,
};
pub use routes::{create_router, RouterConfig};
