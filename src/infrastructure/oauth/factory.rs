//! OAuth state store selection

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::DomainError;
use crate::domain::oauth::{DEFAULT_STATE_TTL_SECS, OAuthStateStore};

use super::in_memory::InMemoryOAuthStateStore;
use super::redis::RedisOAuthStateStore;

/// Where pending OAuth logins are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthStateBackend {
    /// Process-local; fine for a single instance
    #[default]
    Memory,
    /// Shared across instances
    Redis,
}

impl std::fmt::Display for OAuthStateBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for OAuthStateBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in_memory" | "inmemory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown OAuth state backend: {}. Valid backends: memory, redis",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthStateStoreConfig {
    pub backend: OAuthStateBackend,
    pub ttl_secs: u64,
    /// Required for the Redis backend
    pub redis_url: Option<String>,
}

impl Default for OAuthStateStoreConfig {
    fn default() -> Self {
        Self {
            backend: OAuthStateBackend::Memory,
            ttl_secs: DEFAULT_STATE_TTL_SECS,
            redis_url: None,
        }
    }
}

/// Build the configured store
pub async fn create_oauth_state_store(
    config: &OAuthStateStoreConfig,
) -> Result<Arc<dyn OAuthStateStore>, DomainError> {
    info!(backend = %config.backend, ttl_secs = config.ttl_secs, "Creating OAuth state store");

    match config.backend {
        OAuthStateBackend::Memory => Ok(Arc::new(InMemoryOAuthStateStore::new(config.ttl_secs))),
        OAuthStateBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                DomainError::configuration("Redis URL is required for the redis OAuth state backend")
            })?;

            Ok(Arc::new(
                RedisOAuthStateStore::connect(url, config.ttl_secs).await?,
            ))
        }
    }
}
