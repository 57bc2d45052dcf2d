//! Configuration management for the photo thumbnail server.
//!
//! Every option is a command-line flag with an environment variable fallback
//! and a default, so a bare `photo-thumbs` picks everything up from the
//! environment the way container deployments expect.
//!
//! # Environment Variables
//!
//! - `HOST` / `PORT` - Bind address (default: 0.0.0.0:8080)
//! - `DB_HOST` / `DB_PORT` - Metadata database (default: 127.0.0.1:3306)
//! - `DB_TABLE` - Schema holding the `photos` table (default: photos2)
//! - `DB_USERNAME` / `DB_PASSWORD` - Database credentials (default: photos/photos)
//! - `POOL_SIZE` - Database connection pool capacity (default: 10)
//! - `POOL_ACQUIRE_TIMEOUT_MS` - Wait for a pooled connection (default: 1000)
//! - `ROOT_CONTEXT` - URL path prefix for photo requests (default: /photos/photo/)
//! - `PHOTO_ROOT` - Mount point of the photo files (default: /mnt/photos/)
//! - `LFU_CACHE_MAX_COUNT` - Number of transformed photos to cache (default: 32)
//! - `JPEG_QUALITY` - Output JPEG quality (default: 75)

use std::time::Duration;

use clap::Parser;

use crate::photo::{DEFAULT_CACHE_MAX_COUNT, DEFAULT_JPEG_QUALITY};
use crate::store::{PoolSettings, DEFAULT_PHOTO_ROOT};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default database host.
pub const DEFAULT_DB_HOST: &str = "127.0.0.1";

/// Default database port.
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Default schema containing the `photos` table.
pub const DEFAULT_DB_TABLE: &str = "photos2";

/// Default database user.
pub const DEFAULT_DB_USERNAME: &str = "photos";

/// Default database password.
pub const DEFAULT_DB_PASSWORD: &str = "photos";

/// Default connection pool capacity.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Default wait for a pooled connection, in milliseconds.
pub const DEFAULT_POOL_ACQUIRE_TIMEOUT_MS: u64 = 1000;

/// Default URL prefix for photo requests.
pub const DEFAULT_ROOT_CONTEXT: &str = "/photos/photo/";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Photo Thumbs - serves resized and rotated photos by named size.
#[derive(Parser, Debug, Clone)]
#[command(name = "photo-thumbs")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// URL path prefix; the rest of the path holds key/value pairs.
    #[arg(long, default_value = DEFAULT_ROOT_CONTEXT, env = "ROOT_CONTEXT")]
    pub root_context: String,

    // =========================================================================
    // Database Configuration
    // =========================================================================
    /// Metadata database host.
    #[arg(long, default_value = DEFAULT_DB_HOST, env = "DB_HOST")]
    pub db_host: String,

    /// Metadata database port.
    #[arg(long, default_value_t = DEFAULT_DB_PORT, env = "DB_PORT")]
    pub db_port: u16,

    /// Schema containing the `photos` table.
    #[arg(long, default_value = DEFAULT_DB_TABLE, env = "DB_TABLE")]
    pub db_table: String,

    /// Database user.
    #[arg(long, default_value = DEFAULT_DB_USERNAME, env = "DB_USERNAME")]
    pub db_username: String,

    /// Database password.
    #[arg(long, default_value = DEFAULT_DB_PASSWORD, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: String,

    /// Maximum number of pooled database connections.
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE, env = "POOL_SIZE")]
    pub pool_size: u32,

    /// How long a request waits for a pooled connection before failing with 503.
    #[arg(long, default_value_t = DEFAULT_POOL_ACQUIRE_TIMEOUT_MS, env = "POOL_ACQUIRE_TIMEOUT_MS")]
    pub pool_acquire_timeout_ms: u64,

    // =========================================================================
    // Photo Configuration
    // =========================================================================
    /// Directory the photo paths in the database are relative to.
    #[arg(long, default_value = DEFAULT_PHOTO_ROOT, env = "PHOTO_ROOT")]
    pub photo_root: String,

    /// Maximum number of transformed photos to keep in memory.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_COUNT, env = "LFU_CACHE_MAX_COUNT")]
    pub lfu_cache_max_count: usize,

    /// JPEG quality for transformed photos (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "JPEG_QUALITY")]
    pub jpeg_quality: u8,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.pool_size == 0 {
            return Err("pool_size must be greater than 0".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if !self.root_context.starts_with('/') {
            return Err(format!(
                "root_context must start with '/', got {:?}",
                self.root_context
            ));
        }

        // Interpolated into the lookup query
        let valid_schema = !self.db_table.is_empty()
            && self
                .db_table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if !valid_schema {
            return Err(format!(
                "db_table must be a plain schema name ([A-Za-z0-9_$]), got {:?}",
                self.db_table
            ));
        }

        if self.photo_root.is_empty() {
            return Err("photo_root is required. Set --photo-root or PHOTO_ROOT".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Database location for logging, without credentials.
    pub fn database_display(&self) -> String {
        format!(
            "mysql://{}@{}:{}/{}",
            self.db_username, self.db_host, self.db_port, self.db_table
        )
    }

    /// Connection pool settings for the metadata database.
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            host: self.db_host.clone(),
            port: self.db_port,
            username: self.db_username.clone(),
            password: self.db_password.clone(),
            schema: self.db_table.clone(),
            max_connections: self.pool_size,
            acquire_timeout: Duration::from_millis(self.pool_acquire_timeout_ms),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
