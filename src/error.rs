use thiserror::Error;

/// Errors from the raw photo storage mount
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No file exists at the requested path
    #[error("Photo file not found: {0}")]
    NotFound(String),

    /// Path escapes the storage root or is otherwise malformed
    #[error("Invalid photo path: {0}")]
    InvalidPath(String),

    /// Any other read failure
    #[error("Storage I/O error: {0}")]
    Io(String),
}

/// Errors from the photo metadata database
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    /// The connection pool could not hand out a connection in time
    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    /// The lookup query failed
    #[error("Metadata query failed: {0}")]
    Query(String),
}

/// Errors that can occur while resolving a photo at a requested size
#[derive(Debug, Clone, Error)]
pub enum PhotoError {
    /// Source bytes could not be decoded as an image
    #[error("Failed to decode photo: {message}")]
    DecodeFailure { message: String },

    /// Transformed image could not be encoded as JPEG
    #[error("Failed to encode photo: {message}")]
    EncodeFailure { message: String },

    /// The computed output has a zero-sized dimension
    #[error("Transform produced an empty image ({width}x{height})")]
    EmptyOutput { width: u32, height: u32 },

    /// Raw bytes could not be read from storage
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// The blocking transform task panicked or was cancelled
    #[error("Transform aborted: {message}")]
    TransformAborted { message: String },
}
