//! Configuration management for the terrain server.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `CTS_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```
//! use clap::Parser;
//! use cesium_terrain_server::config::Config;
//!
//! let config = Config::parse_from(["cesium-terrain-server", "--port", "9000", "--cacheable"]);
//! assert_eq!(config.bind_address(), "0.0.0.0:9000");
//! assert!(config.cache_config().is_some());
//! ```
//!
//! # Environment Variables
//!
//! - `CTS_HOST` - Server bind address (default: 0.0.0.0)
//! - `CTS_PORT` - Server port (default: 8000)
//! - `CTS_DIR` - Tileset root directory (default: .)
//! - `CTS_BASE_TERRAIN_URL` - URL prefix for tilesets (default: /tilesets)
//! - `CTS_CACHEABLE` - Enable the response cache (default: false)
//! - `CTS_CACHE_LIMIT` - Largest cacheable response (default: 1MB)
//! - `CTS_CACHE_TOTAL` - Total cache budget (default: 100MB)
//! - `CTS_CACHE_TTL` - Cache entry lifetime in seconds, 0 to disable (default: 0)
//! - `CTS_REQUEST_TIMEOUT` - Per-request timeout in seconds (default: 30)

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::bytesize::ByteSize;
use crate::cache::CacheConfig;
use crate::server::RouterConfig;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default tileset root.
pub const DEFAULT_DIR: &str = ".";

/// Default URL prefix for tilesets.
pub const DEFAULT_BASE_TERRAIN_URL: &str = "/tilesets";

/// Default per-entry cache limit.
pub const DEFAULT_CACHE_LIMIT: &str = "1MB";

/// Default total cache budget.
pub const DEFAULT_CACHE_TOTAL: &str = "100MB";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Cesium Terrain Server - serves heightmap terrain tilesets to Cesium.
///
/// Tilesets are directories under `--dir` holding a `layer.json` manifest
/// and a `{z}/{x}/{y}.terrain` tree of gzipped tiles.
#[derive(Parser, Debug, Clone)]
#[command(name = "cesium-terrain-server")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "CTS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "CTS_PORT")]
    pub port: u16,

    /// Root directory containing the tilesets.
    #[arg(short, long, default_value = DEFAULT_DIR, env = "CTS_DIR")]
    pub dir: PathBuf,

    /// URL prefix the tilesets are served under.
    #[arg(long, default_value = DEFAULT_BASE_TERRAIN_URL, env = "CTS_BASE_TERRAIN_URL")]
    pub base_terrain_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "CTS_REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Cache successful responses in memory.
    #[arg(
        long,
        default_value_t = false,
        env = "CTS_CACHEABLE",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub cacheable: bool,

    /// Largest response that will be cached, e.g. `1MB`. 0 means no limit.
    #[arg(long, default_value = DEFAULT_CACHE_LIMIT, env = "CTS_CACHE_LIMIT")]
    pub cache_limit: ByteSize,

    /// Total bytes held by the cache, e.g. `100MB`. 0 means no limit.
    #[arg(long, default_value = DEFAULT_CACHE_TOTAL, env = "CTS_CACHE_TOTAL")]
    pub cache_total: ByteSize,

    /// Lifetime of cached responses in seconds. 0 keeps them until evicted.
    #[arg(long, default_value_t = 0, env = "CTS_CACHE_TTL")]
    pub cache_ttl: u64,

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
        if !self.base_terrain_url.starts_with('/') {
            return Err(format!(
                "base terrain URL must start with '/': {}",
                self.base_terrain_url
            ));
        }

        if !self.dir.exists() {
            return Err(format!(
                "tileset directory does not exist: {}",
                self.dir.display()
            ));
        }
        if !self.dir.is_dir() {
            return Err(format!(
                "tileset path is not a directory: {}",
                self.dir.display()
            ));
        }

        if self.request_timeout == 0 {
            return Err("request_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache budgets, or `None` when caching is disabled.
    pub fn cache_config(&self) -> Option<CacheConfig> {
        if !self.cacheable {
            return None;
        }

        let config = CacheConfig::new(self.cache_limit.as_usize(), self.cache_total.as_usize());
        Some(match self.cache_ttl {
            0 => config,
            secs => config.with_ttl(Duration::from_secs(secs)),
        })
    }

    /// Router settings derived from this configuration.
    pub fn router_config(&self) -> RouterConfig {
        let router = RouterConfig::new(self.base_terrain_url.clone())
            .with_tracing(!self.no_tracing)
            .with_request_timeout(Duration::from_secs(self.request_timeout));

        match self.cache_config() {
            Some(cache) => router.with_cache(cache),
            None => router,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
