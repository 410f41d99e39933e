//! API credential data model.
//!
//! An [`ApiKey`] is a bearer token, so its `Debug` output is redacted and log
//! lines carry a [`ApiKey::fingerprint`] instead of the raw value.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::UserId;

/// Number of random bytes behind every generated key.
pub const API_KEY_BYTES: usize = 32;

/// Hex characters of the SHA-256 digest kept in fingerprints.
const FINGERPRINT_LEN: usize = 12;

/// Validation errors returned when constructing an [`ApiKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    EmptyApiKey,
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyApiKey => write!(f, "api key must not be empty"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Opaque, high-entropy bearer token.
///
/// # Examples
/// ```
/// use ledger_backend::domain::ApiKey;
///
/// let key = ApiKey::new("c2VjcmV0").expect("non-empty key");
/// assert_eq!(format!("{key:?}"), format!("ApiKey({})", key.fingerprint()));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate and construct an [`ApiKey`].
    pub fn new(raw: impl Into<String>) -> Result<Self, CredentialValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(CredentialValidationError::EmptyApiKey);
        }
        Ok(Self(raw))
    }

    /// Short SHA-256 prefix safe to write to logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut encoded = hex::encode(digest);
        encoded.truncate(FINGERPRINT_LEN);
        encoded
    }

    /// Borrow the raw key.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.fingerprint()).finish()
    }
}

impl From<ApiKey> for String {
    fn from(value: ApiKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for ApiKey {
    type Error = CredentialValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Binding between an API key and its owning account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Secret key value.
    pub api_key: ApiKey,
    /// Owning account.
    pub user_id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn empty_key_is_rejected() {
        assert_eq!(ApiKey::new(""), Err(CredentialValidationError::EmptyApiKey));
    }

    #[rstest]
    fn debug_output_hides_raw_key() {
        let key = ApiKey::new("super-secret-material").expect("key");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret-material"));
        assert!(rendered.contains(&key.fingerprint()));
    }

    #[rstest]
    fn fingerprint_is_stable_and_short() {
        let key = ApiKey::new("abc").expect("key");
        assert_eq!(key.fingerprint(), "ba7816bf8f01");
        assert_eq!(key.fingerprint(), key.fingerprint());
    }

    #[rstest]
    fn credential_serialises_raw_fields() {
        let credential = Credential {
            api_key: ApiKey::new("K").expect("key"),
            user_id: UserId::new("u1").expect("id"),
        };
        let value = serde_json::to_value(&credential).expect("serialise");
        assert_eq!(value, json!({ "api_key": "K", "user_id": "u1" }));
    }
}
