//! Configuration Module
//!
//! Loads server, cache and rate limiter settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheOptions;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Freshness lifetime of cached list reads, in seconds
    pub cache_ttl: u64,
    /// Serve stale cached lists while a refresh runs in the background
    pub stale_while_revalidate: bool,
    /// Interval of the expired-window sweep, in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 300)
    /// - `CACHE_STALE_WHILE_REVALIDATE` - `true`/`false` (default: true)
    /// - `RATE_LIMIT_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    ///
    /// Unparsable values and zero durations fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: read_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_ttl: read_var("CACHE_TTL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cache_ttl),
            stale_while_revalidate: read_var("CACHE_STALE_WHILE_REVALIDATE")
                .unwrap_or(defaults.stale_while_revalidate),
            sweep_interval: read_var("RATE_LIMIT_SWEEP_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.sweep_interval),
        }
    }

    /// Options applied to the per-user list caches.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions::with_ttl(Duration::from_secs(self.cache_ttl))
            .stale_while_revalidate(self.stale_while_revalidate)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

fn read_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_ttl: 300,
            stale_while_revalidate: true,
            sweep_interval: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_ttl, 300);
        assert!(config.stale_while_revalidate);
        assert_eq!(config.sweep_interval, 60);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the env to avoid races between test threads
        env::remove_var("SERVER_PORT");
        env::set_var("CACHE_TTL", "0");
        env::set_var("CACHE_STALE_WHILE_REVALIDATE", "false");
        env::set_var("RATE_LIMIT_SWEEP_INTERVAL", "nope");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_ttl, 300);
        assert!(!config.stale_while_revalidate);
        assert_eq!(config.sweep_interval, 60);

        env::set_var("CACHE_TTL", "30");
        assert_eq!(Config::from_env().cache_ttl, 30);

        env::remove_var("CACHE_TTL");
        env::remove_var("CACHE_STALE_WHILE_REVALIDATE");
        env::remove_var("RATE_LIMIT_SWEEP_INTERVAL");
    }

    #[test]
    fn test_cache_options() {
        let config = Config {
            cache_ttl: 10,
            stale_while_revalidate: false,
            ..Config::default()
        };
        let options = config.cache_options();
        assert_eq!(options.ttl, Duration::from_secs(10));
        assert!(!options.stale_while_revalidate);
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }
}
