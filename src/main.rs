//! Cesium Terrain Server - serves heightmap terrain tilesets to Cesium.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cesium_terrain_server::{
    bytesize::ByteSize,
    config::Config,
    server::{create_router_with_cache, serve, DEFAULT_DRAIN_TIMEOUT},
    store::FsStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let store = match FsStore::new(config.dir()) {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot open tileset directory {}: {}", config.dir().display(), e);
            return ExitCode::FAILURE;
        }
    };

    info!("Cesium Terrain Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Tileset root: {}", store.root().display());
    info!("  Base URL: {}", config.base_terrain_url);
    info!("  Request timeout: {}s", config.request_timeout);

    match config.cache_config() {
        Some(cache) => {
            info!(
                "  Cache: enabled, {} per entry, {} total",
                describe_limit(cache.entry_limit),
                describe_limit(cache.total_limit)
            );
            if let Some(ttl) = cache.ttl {
                info!("  Cache TTL: {}s", ttl.as_secs());
            }
        }
        None => info!("  Cache: disabled"),
    }

    let (router, cache) = create_router_with_cache(store, config.router_config());

    // Expired entries are also dropped lazily on lookup; this releases the
    // memory of entries nobody asks for again.
    if let Some(cache) = cache.filter(|cache| cache.ttl().is_some()) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    info!(purged, remaining = cache.len(), "Purged expired cache entries");
                }
            }
        });
    }

    // Bind and serve
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl http://{}{}/<tileset>/layer.json",
        addr,
        config.base_terrain_url.trim_end_matches('/')
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    if let Err(e) = serve(listener, router, shutdown_signal(), DEFAULT_DRAIN_TIMEOUT).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn describe_limit(bytes: usize) -> String {
    if bytes == 0 {
        "unlimited".to_string()
    } else {
        ByteSize::new(bytes as u64).to_string()
    }
}

/// Initialize the tracing subscriber.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "cesium_terrain_server=debug,tower_http=debug"
    } else {
        "cesium_terrain_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
