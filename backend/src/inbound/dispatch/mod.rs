//! Operation dispatcher: the single entry point for tagged calls.
//!
//! A [`DispatchRequest`] is decoded into an [`Operation`], executed against
//! the driving ports in [`LedgerServices`], and rendered as a string body.
//! Failures travel back unchanged in kind; nothing is retried or downgraded.

use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};

use crate::domain::{Error, LedgerServices};

mod operation;

pub use operation::{DispatchRequest, OPERATION_TAGS, Operation};

/// Body returned by `createUser`.
pub const USER_CREATED: &str = "User created successfully";
/// Body returned by `updateWallet` and `addWallet`.
pub const WALLET_UPDATED: &str = "Wallet amount updated successfully";

/// Routes operations to the credential manager, account ledger, and metered
/// call workflow.
#[derive(Clone)]
pub struct Dispatcher {
    services: LedgerServices,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value)
        .map_err(|err| Error::internal(format!("failed to encode response: {err}")))
}

impl Dispatcher {
    /// Wrap the driving ports the operations execute against.
    pub fn new(services: LedgerServices) -> Self {
        Self { services }
    }

    /// Decode and execute one call, returning its string body.
    ///
    /// # Errors
    ///
    /// Returns the decode failure (`InvalidOperation`, `InvalidPayload`) or
    /// the failure raised by the delegated service.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<String, Error> {
        let span = info_span!("dispatch", operation = %request.operation);
        async move {
            let outcome = match Operation::decode(request) {
                Ok(operation) => self.execute(operation).await,
                Err(err) => Err(err),
            };
            match &outcome {
                Ok(_) => info!("dispatch succeeded"),
                Err(err) => warn!(code = ?err.code(), error = %err, "dispatch failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Execute an already validated operation.
    pub async fn execute(&self, operation: Operation) -> Result<String, Error> {
        let LedgerServices {
            credentials,
            ledger,
            metered_call,
        } = &self.services;

        match operation {
            Operation::CreateUser(account) => {
                ledger.create_account(account).await?;
                Ok(USER_CREATED.to_owned())
            }
            Operation::GetUser(user_id) => to_json(&ledger.get_account(&user_id).await?),
            Operation::UpdateWallet { user_id, amount }
            | Operation::AddWallet { user_id, amount } => {
                ledger.adjust_balance(&user_id, amount).await?;
                Ok(WALLET_UPDATED.to_owned())
            }
            Operation::GetApiKeyFromUser(user_id) => {
                let held = credentials.list_for_account(&user_id).await?;
                let first = held
                    .first()
                    .ok_or_else(|| Error::not_found("API key not found"))?;
                to_json(first)
            }
            Operation::GetUserFromApiKey(api_key) => {
                Ok(credentials.resolve_account(&api_key).await?.into())
            }
            Operation::GenerateApiKey(user_id) => {
                Ok(credentials.generate(&user_id).await?.into())
            }
            Operation::LogTransaction {
                user_id,
                amount,
                description,
            } => Ok(ledger
                .record_transaction(&user_id, amount, &description)
                .await?
                .to_string()),
            Operation::GetTransactionHistory(user_id) => {
                to_json(&ledger.get_history(&user_id).await?)
            }
            Operation::CallApi(api_key) => {
                let receipt = metered_call.call(&api_key).await?;
                Ok(format!("{} ms", receipt.elapsed_millis))
            }
        }
    }
}
