//! Photo Thumbs - serves stored photos at named sizes.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_thumbs::{
    create_router, Config, LocalPhotoStore, MySqlPhotoMetadata, PhotoService, PhotoTransformer,
    RouterConfig,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Photo Thumbs v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Database: {}", config.database_display());
    info!(
        "  Pool: {} connections, {}ms acquire timeout",
        config.pool_size, config.pool_acquire_timeout_ms
    );
    info!("  Photo root: {}", config.photo_root);
    info!("  Root context: {}", config.root_context);
    info!(
        "  Cache: {} photos, JPEG quality {}",
        config.lfu_cache_max_count, config.jpeg_quality
    );

    // Connections open on first request
    let metadata = Arc::new(MySqlPhotoMetadata::connect_lazy(&config.pool_settings()));

    let store = LocalPhotoStore::new(&config.photo_root);
    let photo_service = Arc::new(
        PhotoService::with_cache_max_count(store, config.lfu_cache_max_count)
            .with_transformer(PhotoTransformer::with_quality(config.jpeg_quality)),
    );

    let router_config =
        RouterConfig::new(config.root_context.clone()).with_tracing(!config.no_tracing);
    let router = create_router(Arc::clone(&metadata), photo_service, router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!(
        "  Try: curl -o photo.jpg http://{}{}id/<id>/size/small",
        addr, config.root_context
    );

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    metadata.close().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photo_thumbs=debug,tower_http=debug"
    } else {
        "photo_thumbs=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
