//! Driving port for billable API calls.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{ApiKey, Error, TransactionId, UserId};

/// Outcome of a completed metered call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteredCallReceipt {
    /// Account that was charged.
    pub user_id: UserId,
    /// Simulated work duration in milliseconds, in `[0, 1000)`.
    pub elapsed_millis: u32,
    /// Amount debited, equal to `elapsed_millis / 1000`.
    pub cost: Decimal,
    /// Ledger entry recording the debit.
    pub transaction_id: TransactionId,
}

/// Driving port for the resolve, simulate, debit, record workflow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeteredCall: Send + Sync {
    /// Run one billable call on behalf of the holder of `api_key`.
    ///
    /// # Errors
    ///
    /// - Resolve failures propagate unchanged and nothing is charged.
    /// - A debit failure leaves the balance untouched.
    /// - A record failure leaves the balance debited with no ledger entry.
    async fn call(&self, api_key: &ApiKey) -> Result<MeteredCallReceipt, Error>;
}
