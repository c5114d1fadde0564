//! Identity-proof collaborator used once per token issuance

use async_trait::async_trait;
use thiserror::Error;

/// Why an identity proof was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProofError {
    /// The referenced proof document does not exist
    #[error("Proof paste not found")]
    PasteNotFound,

    /// The proof document belongs to a different identity
    #[error("Proof paste was created by a different user")]
    UidMismatch,

    /// The proof document does not hold the expected content
    #[error("Proof paste content does not match")]
    ContentMismatch,

    /// Transport error, timeout or unexpected response
    #[error("Identity verification failed: {0}")]
    Failed(String),
}

/// Checks that `identity` really controls the account behind `proof`
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, identity: &str, proof: &str) -> Result<(), ProofError>;
}
