//! Credential manager domain service.
//!
//! Issues opaque API keys from a secure entropy source and resolves them back
//! to accounts through the typed [`LedgerStore`].

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ports::{CredentialEntropy, CredentialEntropyError, CredentialManager};
use crate::domain::store::map_store_error;
use crate::domain::{API_KEY_BYTES, ApiKey, Credential, Error, LedgerStore, UserId};

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl CredentialEntropy for OsEntropy {
    fn fill(&self, buffer: &mut [u8]) -> Result<(), CredentialEntropyError> {
        OsRng
            .try_fill_bytes(buffer)
            .map_err(|err| CredentialEntropyError::unavailable(err.to_string()))
    }
}

/// Credential service implementing [`CredentialManager`].
#[derive(Clone)]
pub struct CredentialService {
    store: LedgerStore,
    entropy: Arc<dyn CredentialEntropy>,
}

impl CredentialService {
    /// Create a service drawing keys from the OS random source.
    pub fn new(store: LedgerStore) -> Self {
        Self::with_entropy(store, Arc::new(OsEntropy))
    }

    /// Create a service with an explicit entropy source.
    pub fn with_entropy(store: LedgerStore, entropy: Arc<dyn CredentialEntropy>) -> Self {
        Self { store, entropy }
    }

    fn mint_key(&self) -> Result<ApiKey, Error> {
        let mut bytes = Zeroizing::new([0_u8; API_KEY_BYTES]);
        self.entropy
            .fill(bytes.as_mut_slice())
            .map_err(|err| Error::generation_failed(err.to_string()))?;
        ApiKey::new(STANDARD.encode(bytes.as_slice()))
            .map_err(|err| Error::internal(format!("encoded key rejected: {err}")))
    }
}

#[async_trait]
impl CredentialManager for CredentialService {
    async fn generate(&self, user_id: &UserId) -> Result<ApiKey, Error> {
        let api_key = self.mint_key()?;
        let credential = Credential {
            api_key,
            user_id: user_id.clone(),
        };
        self.store
            .put_credential(&credential)
            .await
            .map_err(map_store_error)?;
        info!(
            user_id = %user_id,
            key_fingerprint = %credential.api_key.fingerprint(),
            "issued api key"
        );
        Ok(credential.api_key)
    }

    async fn resolve_account(&self, api_key: &ApiKey) -> Result<UserId, Error> {
        match self
            .store
            .get_credential(api_key)
            .await
            .map_err(map_store_error)?
        {
            Some(credential) => Ok(credential.user_id),
            None => {
                debug!(key_fingerprint = %api_key.fingerprint(), "unknown api key");
                Err(Error::not_found("API key not found"))
            }
        }
    }

    async fn list_for_account(&self, user_id: &UserId) -> Result<Vec<Credential>, Error> {
        self.store
            .credentials_for(user_id)
            .await
            .map_err(map_store_error)
    }
}
