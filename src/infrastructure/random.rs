//! Operating system backed random source

use rand::RngCore;
use rand::rngs::OsRng;

use crate::domain::{DomainError, RandomSource};

/// Reads from the operating system's CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn fill(&self, buf: &mut [u8]) -> Result<(), DomainError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| DomainError::credential_generation(e.to_string()))
    }
}

/// Random source that is always unavailable
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRandomSource;

#[cfg(test)]
impl RandomSource for UnavailableRandomSource {
    fn fill(&self, _buf: &mut [u8]) -> Result<(), DomainError> {
        Err(DomainError::credential_generation("entropy source unavailable"))
    }
}
