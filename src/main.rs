//! Blob Cache - prefetch daemon
//!
//! Builds the cache from environment configuration, warms the configured
//! keys from the upstream store and keeps the cache swept until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blob_cache::{
    spawn_cleanup_task, spawn_stats_reporter, CacheAside, CacheBackend, CacheStrategy, Config, HttpFetcher,
    LruStore, MokaStore,
};

/// Main entry point for the blob cache daemon.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the configured store and the HTTP fetcher
/// 4. Start background TTL cleanup and stats tasks
/// 5. Warm the configured keys
/// 6. Run until SIGINT/SIGTERM, then log final stats
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blob_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Blob Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, capacity_bytes={}, max_items={}, ttl={}s, endpoint={}",
        config.backend, config.capacity_bytes, config.max_items, config.ttl_secs, config.blob_endpoint
    );

    let store: Arc<dyn CacheStrategy> = match config.backend {
        CacheBackend::Lru => Arc::new(LruStore::new(config.capacity_bytes, config.max_items, config.ttl())),
        CacheBackend::Moka => Arc::new(MokaStore::new(config.capacity_bytes, config.max_items, config.ttl())),
    };
    let fetcher = HttpFetcher::new(&config.blob_endpoint, config.fetch_timeout())
        .context("Failed to build HTTP fetcher")?;
    let cache = CacheAside::from_config(&config, store, Arc::new(fetcher));
    info!("Cache initialized");

    let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(config.cleanup_interval.max(1)));
    let stats_handle = spawn_stats_reporter(cache.clone(), Duration::from_secs(config.stats_interval.max(1)));

    if !config.warm_keys.is_empty() {
        let warm = cache.warm_keys(config.warm_keys.iter().cloned()).await;
        info!(
            "Warm-up dispatched: {} fetching, {} already cached, {} invalid",
            warm.dispatched, warm.already_cached, warm.invalid
        );
    }

    shutdown_signal().await;

    cleanup_handle.abort();
    stats_handle.abort();
    warn!("Background tasks aborted");

    let stats = serde_json::to_string(&cache.stats()).context("Failed to serialize stats")?;
    info!("Final stats: {}", stats);
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
