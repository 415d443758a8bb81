//! Redis-backed OAuth state store

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::debug;

use super::generate_state;
use crate::domain::oauth::{OAuthPendingState, OAuthStateStore, ProviderType, clamp_state_ttl};
use crate::domain::{Clock, DomainError, RandomSource, SystemClock};
use crate::infrastructure::random::OsRandomSource;

const KEY_PREFIX: &str = "oauth_state";

/// Pending logins shared between every instance behind a load balancer.
///
/// Entries are written with `SET .. EX` and consumed with `GETDEL`, so a
/// state is handed out at most once even across processes.
#[derive(Clone)]
pub struct RedisOAuthStateStore {
    connection: ConnectionManager,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl fmt::Debug for RedisOAuthStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisOAuthStateStore")
            .field("connection", &"<ConnectionManager>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl RedisOAuthStateStore {
    pub async fn connect(url: &str, ttl_secs: u64) -> Result<Self, DomainError> {
        let client = Client::open(url)
            .map_err(|e| DomainError::configuration(format!("Invalid Redis URL: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            connection,
            ttl: Duration::seconds(clamp_state_ttl(ttl_secs) as i64),
            clock: Arc::new(SystemClock),
            random: Arc::new(OsRandomSource),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn key(state: &str) -> String {
        format!("{}:{}", KEY_PREFIX, state)
    }
}

#[async_trait]
impl OAuthStateStore for RedisOAuthStateStore {
    async fn begin(&self, provider: ProviderType) -> Result<String, DomainError> {
        let state = generate_state(self.random.as_ref())?;
        let pending = OAuthPendingState::new(state.clone(), provider, self.clock.now());

        let value = serde_json::to_string(&pending)
            .map_err(|e| DomainError::internal(format!("Failed to encode OAuth state: {}", e)))?;

        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(Self::key(&state), value, self.ttl.num_seconds() as u64)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to store OAuth state: {}", e)))?;

        debug!(provider = %provider, "OAuth login started");
        Ok(state)
    }

    async fn consume(&self, state: &str) -> Result<Option<OAuthPendingState>, DomainError> {
        let mut conn = self.connection.clone();

        let value: Option<String> = redis::cmd("GETDEL")
            .arg(Self::key(state))
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to consume OAuth state: {}", e)))?;

        let Some(value) = value else {
            return Ok(None);
        };

        let pending: OAuthPendingState = serde_json::from_str(&value)
            .map_err(|e| DomainError::internal(format!("Corrupt OAuth state entry: {}", e)))?;

        if pending.is_expired(self.clock.now(), self.ttl) {
            debug!(provider = %pending.provider_type, "OAuth state expired");
            return Ok(None);
        }

        Ok(Some(pending))
    }
}
