//! Operation envelope and its strongly typed decoding.
//!
//! Every recognised tag maps to exactly one [`Operation`] variant. Payload
//! shape is checked here, before any port is called, so a malformed payload
//! always surfaces as `InvalidPayload` and never as a downstream failure.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::{Account, ApiKey, Error, UserId};

/// Inbound call envelope: an operation tag plus a tag-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Operation tag, for example `getUser`.
    pub operation: String,
    /// Tag-specific payload; absent payloads decode as `null`.
    #[serde(default)]
    pub payload: Value,
}

impl DispatchRequest {
    /// Build an envelope from a tag and its payload.
    pub fn new(operation: impl Into<String>, payload: Value) -> Self {
        Self {
            operation: operation.into(),
            payload,
        }
    }
}

/// Tags accepted by the dispatcher.
pub const OPERATION_TAGS: [&str; 10] = [
    "createUser",
    "getUser",
    "updateWallet",
    "addWallet",
    "getApiKeyFromUser",
    "getUserFromApiKey",
    "generateApiKey",
    "logTransaction",
    "getTransactionHistory",
    "callAPI",
];

/// A validated operation ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Store a new account record.
    CreateUser(Account),
    /// Look up one account.
    GetUser(UserId),
    /// Balance adjustment of either sign.
    UpdateWallet { user_id: UserId, amount: Decimal },
    /// Credit-only balance adjustment.
    AddWallet { user_id: UserId, amount: Decimal },
    /// List the keys bound to an account.
    GetApiKeyFromUser(UserId),
    /// Resolve a key to its owning account.
    GetUserFromApiKey(ApiKey),
    /// Issue a fresh key for an account.
    GenerateApiKey(UserId),
    /// Append a ledger entry without touching the balance.
    LogTransaction {
        user_id: UserId,
        amount: Decimal,
        description: String,
    },
    /// List an account's ledger entries in insertion order.
    GetTransactionHistory(UserId),
    /// Run the metered call workflow for a key.
    CallApi(ApiKey),
}

#[derive(Debug, Deserialize)]
struct CreateUserPayload {
    #[serde(alias = "userID", alias = "userId")]
    user_id: UserId,
    #[serde(default)]
    email: String,
    #[serde(default, alias = "walletAmount")]
    wallet_amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct WalletPayload {
    #[serde(alias = "userID", alias = "userId")]
    user_id: UserId,
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct TransactionPayload {
    #[serde(alias = "userID", alias = "userId")]
    user_id: UserId,
    amount: Decimal,
    description: String,
}

fn decode<T: DeserializeOwned>(tag: &str, payload: Value) -> Result<T, Error> {
    serde_json::from_value(payload).map_err(|err| {
        Error::invalid_payload(format!("invalid payload for `{tag}`: {err}"))
            .with_details(json!({ "operation": tag }))
    })
}

impl Operation {
    /// Validate `request` into an operation.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` when the tag is not recognised.
    /// - `InvalidPayload` when the payload does not fit the tag.
    ///
    /// # Examples
    /// ```
    /// use ledger_backend::domain::ErrorCode;
    /// use ledger_backend::inbound::dispatch::{DispatchRequest, Operation};
    /// use serde_json::json;
    ///
    /// let op = Operation::decode(DispatchRequest::new("getUser", json!("u1")))
    ///     .expect("valid request");
    /// assert_eq!(op.tag(), "getUser");
    ///
    /// let err = Operation::decode(DispatchRequest::new("deleteUser", json!("u1")))
    ///     .expect_err("unknown tag");
    /// assert_eq!(err.code(), ErrorCode::InvalidOperation);
    /// ```
    pub fn decode(request: DispatchRequest) -> Result<Self, Error> {
        let DispatchRequest { operation, payload } = request;
        let tag = operation.as_str();
        let decoded = match tag {
            "createUser" => {
                let fields: CreateUserPayload = decode(tag, payload)?;
                Self::CreateUser(Account::new(fields.user_id, fields.email, fields.wallet_amount))
            }
            "getUser" => Self::GetUser(decode(tag, payload)?),
            "updateWallet" => {
                let WalletPayload { user_id, amount } = decode(tag, payload)?;
                Self::UpdateWallet { user_id, amount }
            }
            "addWallet" => {
                let WalletPayload { user_id, amount } = decode(tag, payload)?;
                if amount <= Decimal::ZERO {
                    return Err(Error::invalid_payload(
                        "amount for `addWallet` must be positive",
                    )
                    .with_details(json!({ "operation": tag })));
                }
                Self::AddWallet { user_id, amount }
            }
            "getApiKeyFromUser" => Self::GetApiKeyFromUser(decode(tag, payload)?),
            "getUserFromApiKey" => Self::GetUserFromApiKey(decode(tag, payload)?),
            "generateApiKey" => Self::GenerateApiKey(decode(tag, payload)?),
            "logTransaction" => {
                let TransactionPayload {
                    user_id,
                    amount,
                    description,
                } = decode(tag, payload)?;
                Self::LogTransaction {
                    user_id,
                    amount,
                    description,
                }
            }
            "getTransactionHistory" => Self::GetTransactionHistory(decode(tag, payload)?),
            "callAPI" => Self::CallApi(decode(tag, payload)?),
            _ => {
                return Err(Error::invalid_operation(format!(
                    "unknown operation `{operation}`"
                ))
                .with_details(json!({ "supported": OPERATION_TAGS })));
            }
        };
        Ok(decoded)
    }

    /// External tag of this operation.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CreateUser(_) => "createUser",
            Self::GetUser(_) => "getUser",
            Self::UpdateWallet { .. } => "updateWallet",
            Self::AddWallet { .. } => "addWallet",
            Self::GetApiKeyFromUser(_) => "getApiKeyFromUser",
            Self::GetUserFromApiKey(_) => "getUserFromApiKey",
            Self::GenerateApiKey(_) => "generateApiKey",
            Self::LogTransaction { .. } => "logTransaction",
            Self::GetTransactionHistory(_) => "getTransactionHistory",
            Self::CallApi(_) => "callAPI",
        }
    }
}
