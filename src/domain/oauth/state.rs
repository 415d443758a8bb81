use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Identity provider kinds a login can be started for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Oidc,
    #[serde(rename = "azuread")]
    AzureAd,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oidc => "oidc",
            Self::AzureAd => "azuread",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oidc" => Ok(Self::Oidc),
            "azuread" => Ok(Self::AzureAd),
            other => Err(DomainError::validation(format!(
                "Unsupported provider '{}'",
                other
            ))),
        }
    }
}

/// A login that has been started but whose callback has not arrived yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthPendingState {
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub provider_type: ProviderType,
}

impl OAuthPendingState {
    pub fn new(
        state: impl Into<String>,
        provider_type: ProviderType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            state: state.into(),
            created_at,
            provider_type,
        }
    }

    /// Whether the state is older than `ttl` at `now`
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}
