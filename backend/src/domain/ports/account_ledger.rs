//! Driving port for account and ledger operations.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Account, Error, TransactionEntry, TransactionId, UserId};

/// Driving port owning balance mutation and the append-only ledger.
///
/// `adjust_balance` and `record_transaction` are not idempotent: retrying a
/// failed call can apply it twice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountLedger: Send + Sync {
    /// Persist `account` verbatim. An existing account with the same id is
    /// replaced.
    async fn create_account(&self, account: Account) -> Result<(), Error>;

    /// Fetch an account, failing with `NotFound` when absent.
    async fn get_account(&self, user_id: &UserId) -> Result<Account, Error>;

    /// Atomically add `amount` to the wallet. Negative amounts debit and the
    /// balance may go below zero.
    async fn adjust_balance(&self, user_id: &UserId, amount: Decimal) -> Result<(), Error>;

    /// Append a ledger entry and return its server-assigned identifier.
    async fn record_transaction(
        &self,
        user_id: &UserId,
        amount: Decimal,
        description: &str,
    ) -> Result<TransactionId, Error>;

    /// Ledger entries for `user_id` in store order; empty when there are none.
    async fn get_history(&self, user_id: &UserId) -> Result<Vec<TransactionEntry>, Error>;
}
