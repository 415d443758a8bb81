//! In-memory OAuth state store using moka

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use moka::future::Cache;
use tracing::debug;

use super::generate_state;
use crate::domain::oauth::{
    DEFAULT_STATE_TTL_SECS, OAuthPendingState, OAuthStateStore, ProviderType, clamp_state_ttl,
};
use crate::domain::{Clock, DomainError, RandomSource, SystemClock};
use crate::infrastructure::random::OsRandomSource;

const MAX_PENDING_STATES: u64 = 100_000;

/// Process-local store of pending logins.
///
/// Consumption goes through the cache's atomic remove, so one state can be
/// consumed at most once. Expiry is judged against the injected clock;
/// moka's own time-to-live only reclaims memory.
#[derive(Clone)]
pub struct InMemoryOAuthStateStore {
    states: Cache<String, OAuthPendingState>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl std::fmt::Debug for InMemoryOAuthStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOAuthStateStore")
            .field("pending", &self.states.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl InMemoryOAuthStateStore {
    pub fn new(ttl_secs: u64) -> Self {
        let ttl_secs = clamp_state_ttl(ttl_secs);

        let states = Cache::builder()
            .max_capacity(MAX_PENDING_STATES)
            // memory reclamation only; consume decides expiry
            .time_to_live(StdDuration::from_secs(ttl_secs.saturating_mul(2)))
            .build();

        Self {
            states,
            ttl: Duration::seconds(ttl_secs as i64),
            clock: Arc::new(SystemClock),
            random: Arc::new(OsRandomSource),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Whether a state is physically held, expired or not
    pub async fn contains(&self, state: &str) -> bool {
        self.states.get(state).await.is_some()
    }
}

impl Default for InMemoryOAuthStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_TTL_SECS)
    }
}

#[async_trait]
impl OAuthStateStore for InMemoryOAuthStateStore {
    async fn begin(&self, provider: ProviderType) -> Result<String, DomainError> {
        let state = generate_state(self.random.as_ref())?;
        let pending = OAuthPendingState::new(state.clone(), provider, self.clock.now());

        self.states.insert(state.clone(), pending).await;

        debug!(provider = %provider, "OAuth login started");
        Ok(state)
    }

    async fn consume(&self, state: &str) -> Result<Option<OAuthPendingState>, DomainError> {
        let Some(pending) = self.states.remove(state).await else {
            return Ok(None);
        };

        if pending.is_expired(self.clock.now(), self.ttl) {
            debug!(provider = %pending.provider_type, "OAuth state expired");
            return Ok(None);
        }

        Ok(Some(pending))
    }
}
