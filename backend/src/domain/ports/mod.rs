//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_ledger;
mod cost_sampler;
mod credential_entropy;
mod credential_manager;
mod item_store;
mod metered_call;
mod work_sleeper;

#[cfg(test)]
pub use account_ledger::MockAccountLedger;
pub use account_ledger::AccountLedger;
#[cfg(test)]
pub use cost_sampler::MockCostSampler;
pub use cost_sampler::CostSampler;
#[cfg(test)]
pub use credential_entropy::MockCredentialEntropy;
pub use credential_entropy::{CredentialEntropy, CredentialEntropyError};
#[cfg(test)]
pub use credential_manager::MockCredentialManager;
pub use credential_manager::CredentialManager;
#[cfg(test)]
pub use item_store::MockItemStore;
pub use item_store::{ItemStore, ItemStoreError};
#[cfg(test)]
pub use metered_call::MockMeteredCall;
pub use metered_call::{MeteredCall, MeteredCallReceipt};
#[cfg(test)]
pub use work_sleeper::MockWorkSleeper;
pub use work_sleeper::WorkSleeper;
