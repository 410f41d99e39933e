//! Wiring for the domain services behind the driving ports.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{AccountLedger, CredentialManager, ItemStore, MeteredCall};
use crate::domain::{
    AccountLedgerService, CredentialService, LedgerStore, MeteredCallRuntime, MeteredCallService,
};

/// Driving port bundle shared by every inbound adapter.
#[derive(Clone)]
pub struct LedgerServices {
    /// Credential issue and lookup.
    pub credentials: Arc<dyn CredentialManager>,
    /// Accounts, balances, and ledger entries.
    pub ledger: Arc<dyn AccountLedger>,
    /// Billable call workflow.
    pub metered_call: Arc<dyn MeteredCall>,
}

impl LedgerServices {
    /// Build the services over `items` with the default work simulator.
    pub fn new(items: Arc<dyn ItemStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_runtime(items, clock, MeteredCallRuntime::default())
    }

    /// Build the services with an explicit metered call runtime.
    pub fn with_runtime(
        items: Arc<dyn ItemStore>,
        clock: Arc<dyn Clock>,
        runtime: MeteredCallRuntime,
    ) -> Self {
        let store = LedgerStore::new(items);
        let credentials: Arc<dyn CredentialManager> =
            Arc::new(CredentialService::new(store.clone()));
        let ledger: Arc<dyn AccountLedger> = Arc::new(AccountLedgerService::new(store, clock));
        let metered_call: Arc<dyn MeteredCall> = Arc::new(MeteredCallService::new(
            Arc::clone(&credentials),
            Arc::clone(&ledger),
            runtime,
        ));
        Self {
            credentials,
            ledger,
            metered_call,
        }
    }
}
