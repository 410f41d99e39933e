//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the dispatcher and remain testable without I/O.

use std::sync::Arc;

use crate::domain::LedgerServices;
use crate::inbound::dispatch::Dispatcher;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Shared operation dispatcher.
    pub dispatcher: Arc<Dispatcher>,
}

impl HttpState {
    /// Wrap an existing dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

impl From<LedgerServices> for HttpState {
    fn from(services: LedgerServices) -> Self {
        Self::new(Dispatcher::new(services))
    }
}
