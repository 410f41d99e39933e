//! Port for the metered call cost simulator.

/// Source of simulated work durations.
///
/// The value models variable compute time. It is not a security primitive and
/// implementations may use any non-cryptographic generator.
#[cfg_attr(test, mockall::automock)]
pub trait CostSampler: Send + Sync {
    /// Return a whole number of milliseconds in `[0, 1000)`.
    fn sample_millis(&self) -> u32;
}
