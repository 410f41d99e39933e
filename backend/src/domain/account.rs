//! Account data model.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Validation errors returned when constructing account identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyUserId,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "user id must not be empty"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

/// Account identifier assigned by the external identity provider.
///
/// The value is opaque; the only constraint enforced here is that it carries
/// at least one non-whitespace character.
///
/// # Examples
/// ```
/// use ledger_backend::domain::UserId;
///
/// let id = UserId::new("u1").expect("valid id");
/// assert_eq!(id.as_ref(), "u1");
/// assert!(UserId::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, AccountValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AccountValidationError::EmptyUserId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A registered user's monetary position.
///
/// `wallet_amount` is signed; balances may go negative after debits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Primary key.
    pub user_id: UserId,
    /// Contact address; may be empty.
    pub email: String,
    /// Current balance.
    pub wallet_amount: Decimal,
}

impl Account {
    /// Build an account from its parts.
    pub fn new(user_id: UserId, email: impl Into<String>, wallet_amount: Decimal) -> Self {
        Self {
            user_id,
            email: email.into(),
            wallet_amount,
        }
    }
}
