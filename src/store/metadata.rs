//! Photo metadata lookup.
//!
//! Resolves a photo identifier to the storage path, rotation and
//! modification time recorded in the `photos` table.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySqlPool, Row};
use tracing::{debug, warn};

use crate::error::MetadataError;
use crate::photo::PhotoIdentity;

/// Lookup of photo records by identifier.
#[async_trait]
pub trait PhotoMetadata: Send + Sync {
    /// Find the record for `photo_id`.
    ///
    /// Returns `Ok(None)` when no photo has that identifier.
    async fn lookup(&self, photo_id: &str) -> Result<Option<PhotoIdentity>, MetadataError>;
}

/// Connection settings for the metadata database.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,

    /// Schema containing the `photos` table
    pub schema: String,

    /// Upper bound on open connections
    pub max_connections: u32,

    /// How long a request waits for a free connection before giving up
    pub acquire_timeout: Duration,
}

/// MySQL/MariaDB-backed metadata lookup over a bounded pool.
///
/// Connections are opened lazily. Each lookup holds a connection only for the
/// duration of its query; it is returned to the pool before the caller starts
/// any image work.
#[derive(Clone)]
pub struct MySqlPhotoMetadata {
    pool: MySqlPool,
    query: String,
}

impl MySqlPhotoMetadata {
    /// Create the pool without opening any connection yet.
    pub fn connect_lazy(settings: &PoolSettings) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password);

        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_lazy_with(options);

        Self {
            pool,
            query: lookup_query(&settings.schema),
        }
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Connections currently open (idle or in use).
    pub fn open_connections(&self) -> u32 {
        self.pool.size()
    }
}

#[async_trait]
impl PhotoMetadata for MySqlPhotoMetadata {
    async fn lookup(&self, photo_id: &str) -> Result<Option<PhotoIdentity>, MetadataError> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            warn!(error = %e, "Could not get a connection from the pool");
            acquire_error(e)
        })?;

        let row = sqlx::query(&self.query)
            .bind(photo_id)
            .fetch_optional(&mut *conn)
            .await;

        // Release before the caller moves on to transforming.
        drop(conn);

        let Some(row) = row.map_err(|e| MetadataError::Query(e.to_string()))? else {
            debug!(photo_id, "No photo record");
            return Ok(None);
        };

        let path: String = row
            .try_get(0)
            .map_err(|e| MetadataError::Query(e.to_string()))?;
        let rotation: i64 = row
            .try_get(1)
            .map_err(|e| MetadataError::Query(e.to_string()))?;
        let modified: i64 = row
            .try_get(2)
            .map_err(|e| MetadataError::Query(e.to_string()))?;

        let rotation = i32::try_from(rotation)
            .map_err(|_| MetadataError::Query(format!("rotation out of range: {}", rotation)))?;

        Ok(Some(PhotoIdentity::new(path, rotation, modified)))
    }
}

/// Classify a failed `acquire`.
///
/// Timeouts, a closed pool and transport failures mean no connection could be
/// had right now. Anything else (rejected credentials, protocol errors) is
/// reported as a query failure.
fn acquire_error(err: sqlx::Error) -> MetadataError {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => MetadataError::PoolExhausted(err.to_string()),
        other => MetadataError::Query(other.to_string()),
    }
}

/// Build the lookup statement for a schema.
///
/// The schema name is interpolated, so callers must validate it first
/// (see [`Config::validate`](crate::config::Config::validate)). Both numeric
/// columns are cast so integer and DATETIME schemas decode the same way.
pub fn lookup_query(schema: &str) -> String {
    format!(
        "SELECT path, CAST(rotation AS SIGNED), CAST(modified_timestamp AS SIGNED) \
         FROM {}.photos WHERE id_photo = ?",
        schema
    )
}
