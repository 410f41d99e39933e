//! Ledger entry data model.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UserId;

/// Description attached to debits produced by metered calls.
pub const API_CALL_COST_DESCRIPTION: &str = "api call cost";

/// Server-assigned ledger entry identifier.
///
/// Composed of the epoch milliseconds at recording time and a store-issued
/// sequence number, both zero-padded so identifiers sort by time as strings
/// and never collide within a millisecond.
///
/// # Examples
/// ```
/// use ledger_backend::domain::TransactionId;
///
/// let id = TransactionId::compose(1_700_000_000_000, 42);
/// assert_eq!(id.as_ref(), "1700000000000-0000000042");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Build an identifier from a millisecond timestamp and a sequence value.
    pub fn compose(epoch_millis: i64, sequence: u64) -> Self {
        Self(format!("{epoch_millis:013}-{sequence:010}"))
    }

    /// Wrap an identifier read back from storage.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Immutable record of a balance change.
///
/// Negative `amount` values are debits and positive values are credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// Time-ordered identifier.
    pub transaction_id: TransactionId,
    /// Account the entry belongs to.
    pub user_id: UserId,
    /// Signed amount.
    pub amount: Decimal,
    /// Free-form description.
    pub description: String,
}
