// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Flowgate server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file with the route definitions
    pub routes_file: PathBuf,
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// Timeout applied to every outbound call
    pub request_timeout: Duration,
    /// Response-cache TTL for routes that enable caching without a max age
    pub cache_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `FLOWGATE_ROUTES_FILE`: path to the route definition file
    ///
    /// Optional (with defaults):
    /// - `FLOWGATE_PORT`: HTTP port (default: 8080)
    /// - `FLOWGATE_REQUEST_TIMEOUT_MS`: outbound call timeout (default: 30000)
    /// - `FLOWGATE_CACHE_TTL_SECS`: default response-cache TTL (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        let routes_file = std::env::var("FLOWGATE_ROUTES_FILE")
            .map_err(|_| ConfigError::Missing("FLOWGATE_ROUTES_FILE"))?;

        let port: u16 = std::env::var("FLOWGATE_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("FLOWGATE_PORT", "must be a valid port number"))?;

        let request_timeout_ms: u64 = std::env::var("FLOWGATE_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or(ConfigError::Invalid(
                "FLOWGATE_REQUEST_TIMEOUT_MS",
                "must be a positive integer",
            ))?;

        let cache_ttl_secs: u64 = std::env::var("FLOWGATE_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("FLOWGATE_CACHE_TTL_SECS", "must be a non-negative integer")
            })?;

        Ok(Self {
            routes_file: PathBuf::from(routes_file),
            http_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            request_timeout: Duration::from_millis(request_timeout_ms),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Sets env vars for a test and restores them on drop
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    fn clear_optional(guard: &mut EnvGuard) {
        guard.remove("FLOWGATE_PORT");
        guard.remove("FLOWGATE_REQUEST_TIMEOUT_MS");
        guard.remove("FLOWGATE_CACHE_TTL_SECS");
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("FLOWGATE_ROUTES_FILE", "/etc/flowgate/routes.json");
        clear_optional(&mut guard);

        let config = Config::from_env().unwrap();

        assert_eq!(config.routes_file, PathBuf::from("/etc/flowgate/routes.json"));
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_config_from_env_with_overrides() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("FLOWGATE_ROUTES_FILE", "routes.json");
        guard.set("FLOWGATE_PORT", "9090");
        guard.set("FLOWGATE_REQUEST_TIMEOUT_MS", "1500");
        guard.set("FLOWGATE_CACHE_TTL_SECS", "0");

        let config = Config::from_env().unwrap();

        assert_eq!(config.http_addr.port(), 9090);
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.cache_ttl, Duration::ZERO);
    }

    #[test]
    fn test_config_missing_routes_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.remove("FLOWGATE_ROUTES_FILE");
        clear_optional(&mut guard);

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::Missing("FLOWGATE_ROUTES_FILE"))
        ));
    }

    #[test]
    fn test_config_invalid_values() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("FLOWGATE_ROUTES_FILE", "routes.json");
        clear_optional(&mut guard);
        guard.set("FLOWGATE_PORT", "not_a_port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("FLOWGATE_PORT", _))
        ));

        guard.set("FLOWGATE_PORT", "8080");
        guard.set("FLOWGATE_REQUEST_TIMEOUT_MS", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("FLOWGATE_REQUEST_TIMEOUT_MS", _))
        ));
    }
}
