//! HTTP request handlers for the photo thumbnail API.
//!
//! # Endpoints
//!
//! - `GET {root_context}id/{id}[/size/{label}]` - Serve a photo
//! - `GET /health` - Health check endpoint

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::{MetadataError, PhotoError};
use crate::photo::PhotoService;
use crate::store::{PhotoMetadata, PhotoStore};

/// Response header reporting whether the photo came from the transform cache.
pub const CACHE_HIT_HEADER: &str = "x-photo-cache-hit";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<M: PhotoMetadata, S: PhotoStore> {
    /// Photo record lookup
    pub metadata: Arc<M>,

    /// Transform pipeline and cache
    pub photo_service: Arc<PhotoService<S>>,

    /// Path prefix that photo requests must start with
    pub root_context: Arc<str>,
}

impl<M: PhotoMetadata, S: PhotoStore> AppState<M, S> {
    /// Create a new application state.
    pub fn new(
        metadata: Arc<M>,
        photo_service: Arc<PhotoService<S>>,
        root_context: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            metadata,
            photo_service,
            root_context: root_context.into(),
        }
    }
}

impl<M: PhotoMetadata, S: PhotoStore> Clone for AppState<M, S> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            photo_service: Arc::clone(&self.photo_service),
            root_context: Arc::clone(&self.root_context),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Key/value pairs parsed from a photo request path.
///
/// `/photos/photo/id/42/size/small` with root context `/photos/photo/`
/// yields `{id: 42, size: small}`. A trailing key with no value is ignored
/// and a repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoPathParams {
    values: HashMap<String, String>,
}

impl PhotoPathParams {
    /// Parse the path of a request.
    ///
    /// Returns `None` when the path does not start with `root_context`.
    pub fn parse(root_context: &str, path: &str) -> Option<Self> {
        let rest = path.strip_prefix(root_context)?;

        let segments: Vec<String> = rest.split('/').map(decode_segment).collect();
        let values = segments
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Some(Self { values })
    }

    /// Value of an arbitrary key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Photo identifier; an empty value counts as missing.
    pub fn id(&self) -> Option<&str> {
        self.get("id").filter(|id| !id.is_empty())
    }

    /// Requested size label, if any.
    pub fn size(&self) -> Option<&str> {
        self.get("size")
    }
}

fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        // Not valid UTF-8 once decoded; match on the raw text instead
        Err(_) => segment.to_string(),
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "pool_exhausted")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Everything a photo request can fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Bad prefix, missing id, or unknown photo
    #[error("{0}")]
    NotFound(String),

    /// Metadata lookup failed or no connection was available
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Reading or transforming the photo failed
    #[error(transparent)]
    Photo(#[from] PhotoError),
}

impl HandlerError {
    /// Status code and error type identifier for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            HandlerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            HandlerError::Metadata(MetadataError::PoolExhausted(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "pool_exhausted")
            }
            HandlerError::Metadata(MetadataError::Query(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "metadata_error")
            }
            HandlerError::Photo(err) => {
                let error_type = match err {
                    PhotoError::DecodeFailure { .. } => "decode_error",
                    PhotoError::EncodeFailure { .. } => "encode_error",
                    PhotoError::EmptyOutput { .. } => "empty_output",
                    PhotoError::StorageUnavailable(_) => "storage_error",
                    PhotoError::TransformAborted { .. } => "transform_aborted",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, error_type)
            }
        }
    }
}

/// Convert HandlerError to HTTP response.
///
/// Logged by severity: 404s at DEBUG (common and expected), pool
/// exhaustion at WARN, everything else at ERROR.
impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();
        let message = self.to_string();

        if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else if status == StatusCode::SERVICE_UNAVAILABLE {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Service unavailable: {}",
                message
            );
        } else {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle photo requests.
///
/// # Endpoint
///
/// `GET {root_context}{key}/{value}/...`
///
/// # Path Keys
///
/// - `id`: Photo identifier (required)
/// - `size`: Size label such as `small` or `half` (optional; unknown or
///   missing labels return the stored file unchanged)
///
/// # Response
///
/// - `200 OK`: JPEG body
/// - `404 Not Found`: Path outside the root context, no `id`, or unknown photo
/// - `503 Service Unavailable`: No database connection available
/// - `500 Internal Server Error`: Storage, decode or encode failure
///
/// # Headers
///
/// - `Content-Type: image/jpeg`
/// - `Content-Length: {bytes}`
/// - `X-Photo-Cache-Hit: true|false`
pub async fn photo_handler<M, S>(
    State(state): State<AppState<M, S>>,
    uri: Uri,
) -> Result<Response, HandlerError>
where
    M: PhotoMetadata + 'static,
    S: PhotoStore + 'static,
{
    let path = uri.path();

    let params = PhotoPathParams::parse(&state.root_context, path)
        .ok_or_else(|| HandlerError::NotFound(format!("Path outside photo root: {}", path)))?;

    let photo_id = params
        .id()
        .ok_or_else(|| HandlerError::NotFound(format!("No photo id in path: {}", path)))?;

    // The pooled connection is already released when this returns.
    let identity = state
        .metadata
        .lookup(photo_id)
        .await?
        .ok_or_else(|| HandlerError::NotFound(format!("Photo not found: {}", photo_id)))?;

    let response = state
        .photo_service
        .resolve(&identity, params.size())
        .await?;

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
        (header::CONTENT_LENGTH, HeaderValue::from(response.data.len())),
        (
            HeaderName::from_static(CACHE_HIT_HEADER),
            HeaderValue::from_static(if response.cache_hit { "true" } else { "false" }),
        ),
    ];

    Ok((StatusCode::OK, headers, response.data).into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
