//! Driving port for API credential operations.
//!
//! The dispatcher and the metered call workflow call [`CredentialManager`] to
//! issue keys and to map a presented key back to its account.

use async_trait::async_trait;

use crate::domain::{ApiKey, Credential, Error, UserId};

/// Driving port for credential issue and lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialManager: Send + Sync {
    /// Issue a fresh 256-bit key bound to `user_id` and persist the binding.
    ///
    /// Uniqueness is probabilistic: no collision check is made against keys
    /// already issued.
    ///
    /// # Errors
    ///
    /// - [`crate::domain::ErrorCode::GenerationFailed`] when the random source
    ///   is unavailable.
    /// - [`crate::domain::ErrorCode::StoreFailure`] when persistence fails.
    async fn generate(&self, user_id: &UserId) -> Result<ApiKey, Error>;

    /// Resolve `api_key` to the account that owns it.
    ///
    /// # Errors
    ///
    /// [`crate::domain::ErrorCode::NotFound`] when the key is unknown.
    async fn resolve_account(&self, api_key: &ApiKey) -> Result<UserId, Error>;

    /// List the credentials held by `user_id` in store order.
    ///
    /// Returns an empty list when the account holds none.
    async fn list_for_account(&self, user_id: &UserId) -> Result<Vec<Credential>, Error>;
}
