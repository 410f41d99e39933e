//! HTTP server configuration object.

use std::net::SocketAddr;

use ledger_backend::domain::LedgerServices;

/// Configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) services: LedgerServices,
}

impl ServerConfig {
    /// Construct a server configuration over already wired services.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, services: LedgerServices) -> Self {
        Self {
            bind_addr,
            services,
        }
    }
}
