//! Source of cryptographically secure random bytes

use std::fmt::Debug;

use crate::domain::DomainError;

/// Fills buffers with secure random bytes.
///
/// Implementations must fail with [`DomainError::CredentialGeneration`] when
/// the underlying source is unavailable rather than returning weak bytes.
pub trait RandomSource: Send + Sync + Debug {
    fn fill(&self, buf: &mut [u8]) -> Result<(), DomainError>;
}
