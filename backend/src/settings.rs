//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `LEDGER_*` environment variables, configuration files, or
//! command-line flags. The pool size carries a derive-level default so an
//! empty environment still yields a settings object; accessors supply the
//! remaining defaults.

use std::net::{AddrParseError, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::redis::RedisStoreConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REDIS_NAMESPACE: &str = "ledger";
const DEFAULT_REDIS_POOL_SIZE: u32 = 10;

/// Runtime settings for the ledger backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LEDGER")]
pub struct LedgerSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Redis connection URL. When absent the in-memory store is used.
    pub redis_url: Option<String>,
    /// Prefix for every Redis key written by the service.
    pub redis_namespace: Option<String>,
    /// Maximum pooled Redis connections.
    #[ortho_config(default = 10)]
    pub redis_pool_size: u32,
}

impl LedgerSettings {
    /// Parse the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }

    /// Return the configured key namespace, falling back to `ledger`.
    pub fn redis_namespace(&self) -> &str {
        self.redis_namespace
            .as_deref()
            .unwrap_or(DEFAULT_REDIS_NAMESPACE)
    }

    /// Return the pool size, treating zero as the default.
    pub fn redis_pool_size(&self) -> u32 {
        match self.redis_pool_size {
            0 => DEFAULT_REDIS_POOL_SIZE,
            size => size,
        }
    }

    /// Redis pool configuration, or `None` when no URL is configured.
    pub fn redis_store(&self) -> Option<RedisStoreConfig> {
        self.redis_url.as_deref().map(|url| {
            RedisStoreConfig::new(url)
                .with_namespace(self.redis_namespace())
                .with_max_size(self.redis_pool_size())
        })
    }
}
