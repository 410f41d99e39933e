//! Domain primitives, ports, and services.
//!
//! Purpose: model accounts, credentials, and ledger entries, and implement
//! the credential manager, account ledger, and metered call workflow against
//! the [`ports::ItemStore`] seam. Nothing in this module knows which
//! substrate or transport is in use.
//!
//! Public surface:
//! - Error / ErrorCode: failure payload carried to every inbound adapter.
//! - Account, Credential, TransactionEntry and their identifiers.
//! - Item, AttributeValue, Table: the generic substrate model.
//! - LedgerStore: typed adapter over the item store.
//! - LedgerServices: the driving port bundle.

pub mod account;
pub mod credential;
pub mod credentials;
pub mod error;
pub mod item;
pub mod ledger;
pub mod metered_call;
pub mod ports;
pub mod services;
pub mod store;
pub mod trace_id;
pub mod transaction;

pub use self::account::{Account, AccountValidationError, UserId};
pub use self::credential::{API_KEY_BYTES, ApiKey, Credential, CredentialValidationError};
pub use self::credentials::{CredentialService, OsEntropy};
pub use self::error::{Error, ErrorCode};
pub use self::item::{
    AttributeValue, Item, Table, USER_ID_ATTRIBUTE, USER_ID_INDEX, UpdateExpression,
};
pub use self::ledger::AccountLedgerService;
pub use self::metered_call::{
    MAX_SIMULATED_MILLIS, MeteredCallRuntime, MeteredCallService, ThreadRngCostSampler,
    TokioSleeper,
};
pub use self::services::LedgerServices;
pub use self::store::{LedgerStore, TRANSACTION_SEQUENCE};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::transaction::{API_CALL_COST_DESCRIPTION, TransactionEntry, TransactionId};
