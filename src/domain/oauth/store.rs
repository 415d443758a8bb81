use async_trait::async_trait;
use std::fmt::Debug;

use super::state::{OAuthPendingState, ProviderType};
use crate::domain::DomainError;

/// Lifetime of a pending login, in seconds
pub const DEFAULT_STATE_TTL_SECS: u64 = 300;

/// Longest lifetime a pending login may be configured with
pub const MAX_STATE_TTL_SECS: u64 = 86_400;

/// Bring a configured lifetime into `1..=MAX_STATE_TTL_SECS`
pub fn clamp_state_ttl(ttl_secs: u64) -> u64 {
    ttl_secs.clamp(1, MAX_STATE_TTL_SECS)
}

/// Store of pending OAuth logins
#[async_trait]
pub trait OAuthStateStore: Send + Sync + Debug {
    /// Record a new pending login and return its state token
    async fn begin(&self, provider: ProviderType) -> Result<String, DomainError>;

    /// Atomically remove and return a pending login.
    ///
    /// `Ok(None)` covers never issued, already consumed and expired states.
    /// An expired entry is evicted by the same call.
    async fn consume(&self, state: &str) -> Result<Option<OAuthPendingState>, DomainError>;
}
