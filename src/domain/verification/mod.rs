//! Human verification collaborator

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Checks evidence that a submission came from a human
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HumanVerifier: Send + Sync + Debug {
    /// Whether verification is enforced for this deployment
    fn is_required(&self) -> bool;

    /// Verify an evidence token; `Ok(false)` means the evidence was rejected
    async fn verify(&self, token: &str, remote_ip: Option<String>) -> Result<bool, DomainError>;
}
