//! Port for the secure random source behind credential generation.

use super::define_port_error;

define_port_error! {
    /// Errors raised by entropy sources.
    pub enum CredentialEntropyError {
        /// The operating system refused to provide random bytes.
        Unavailable { message: String } =>
            "secure random source unavailable: {message}",
    }
}

/// Cryptographically secure byte source.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialEntropy: Send + Sync {
    /// Fill `buffer` entirely with random bytes.
    fn fill(&self, buffer: &mut [u8]) -> Result<(), CredentialEntropyError>;
}
