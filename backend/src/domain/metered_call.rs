//! Metered call workflow.
//!
//! A billable call runs four strictly sequential stages: resolve the key,
//! simulate variable-cost work, debit the balance, record the debit. Nothing
//! is persisted between stages and nothing is compensated: a failure while
//! recording leaves the balance debited with no matching ledger entry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{error, info, instrument};

use crate::domain::ports::{
    AccountLedger, CostSampler, CredentialManager, MeteredCall, MeteredCallReceipt, WorkSleeper,
};
use crate::domain::{API_CALL_COST_DESCRIPTION, ApiKey, Error};

/// Upper bound (exclusive) of simulated work in milliseconds.
pub const MAX_SIMULATED_MILLIS: u32 = 1_000;

/// Runtime helpers used by the workflow's Simulate stage.
pub struct MeteredCallRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn WorkSleeper>,
    /// Work duration generator.
    pub sampler: Arc<dyn CostSampler>,
}

impl Default for MeteredCallRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            sampler: Arc::new(ThreadRngCostSampler),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl WorkSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Uniform sampler over `[0, 1000)` backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngCostSampler;

impl CostSampler for ThreadRngCostSampler {
    fn sample_millis(&self) -> u32 {
        rand::thread_rng().gen_range(0..MAX_SIMULATED_MILLIS)
    }
}

/// Metered call service implementing [`MeteredCall`].
#[derive(Clone)]
pub struct MeteredCallService {
    credentials: Arc<dyn CredentialManager>,
    ledger: Arc<dyn AccountLedger>,
    sleeper: Arc<dyn WorkSleeper>,
    sampler: Arc<dyn CostSampler>,
}

impl MeteredCallService {
    /// Compose the workflow from its collaborators.
    pub fn new(
        credentials: Arc<dyn CredentialManager>,
        ledger: Arc<dyn AccountLedger>,
        runtime: MeteredCallRuntime,
    ) -> Self {
        Self {
            credentials,
            ledger,
            sleeper: runtime.sleeper,
            sampler: runtime.sampler,
        }
    }
}

#[async_trait]
impl MeteredCall for MeteredCallService {
    #[instrument(skip_all, fields(key_fingerprint = %api_key.fingerprint()))]
    async fn call(&self, api_key: &ApiKey) -> Result<MeteredCallReceipt, Error> {
        let user_id = self.credentials.resolve_account(api_key).await?;

        // Out-of-range samples are clamped so the cost stays below one unit.
        let elapsed_millis = self
            .sampler
            .sample_millis()
            .min(MAX_SIMULATED_MILLIS - 1);
        self.sleeper
            .sleep(Duration::from_millis(u64::from(elapsed_millis)))
            .await;

        let cost = Decimal::new(i64::from(elapsed_millis), 3);
        let debit = -cost;
        // A debit failure is a store failure whatever the ledger reported,
        // including an orphan key whose account was never created.
        self.ledger
            .adjust_balance(&user_id, debit)
            .await
            .map_err(|err| Error::store_failure(err.message().to_owned()))?;

        let transaction_id = match self
            .ledger
            .record_transaction(&user_id, debit, API_CALL_COST_DESCRIPTION)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                error!(
                    user_id = %user_id,
                    unrecorded_amount = %debit,
                    error = %err,
                    "balance debited but ledger entry not recorded"
                );
                return Err(err);
            }
        };

        info!(
            user_id = %user_id,
            elapsed_millis,
            transaction_id = %transaction_id,
            "metered call charged"
        );
        Ok(MeteredCallReceipt {
            user_id,
            elapsed_millis,
            cost,
            transaction_id,
        })
    }
}
