//! Port for suspending a metered call while its simulated work runs.

use std::time::Duration;

use async_trait::async_trait;

/// Async sleeping abstraction so tests can skip real delays.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkSleeper: Send + Sync {
    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}
