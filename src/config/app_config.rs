use serde::Deserialize;
use tracing::warn;

use crate::domain::group_mapping::GroupMappingConfig;
use crate::domain::oauth::{DEFAULT_STATE_TTL_SECS, clamp_state_ttl};
use crate::infrastructure::api_key::DEFAULT_KEY_LABEL;
use crate::infrastructure::auth::IdTokenConfig;
use crate::infrastructure::oauth::{OAuthStateBackend, OAuthStateStoreConfig};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub registry: RegistryConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Name of the organization created at startup and used when a request
    /// names no organization
    pub default_organization: String,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Label minted secrets start with
    pub api_key_prefix: String,
    /// HS256 secret; a random one is generated when unset
    pub jwt_secret: Option<String>,
    pub jwt_expiration_hours: u64,
    pub oauth_state_ttl_secs: u64,
    pub oauth_state_backend: OAuthStateBackend,
    pub redis_url: Option<String>,
    /// Static group mapping rules
    pub oidc: GroupMappingConfig,
    /// Identity provider whose ID tokens the login callback accepts
    pub id_token: IdTokenConfig,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key_prefix", &self.api_key_prefix)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[hidden]"))
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("oauth_state_ttl_secs", &self.oauth_state_ttl_secs)
            .field("oauth_state_backend", &self.oauth_state_backend)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[hidden]"))
            .field("oidc", &self.oidc)
            .field("id_token", &self.id_token)
            .finish()
    }
}

impl AuthConfig {
    /// State store settings, with the lifetime brought into range
    pub fn oauth_state_store(&self) -> OAuthStateStoreConfig {
        let ttl_secs = clamp_state_ttl(self.oauth_state_ttl_secs);
        if ttl_secs != self.oauth_state_ttl_secs {
            warn!(
                configured = self.oauth_state_ttl_secs,
                effective = ttl_secs,
                "OAuth state TTL out of range, clamped"
            );
        }

        OAuthStateStoreConfig {
            backend: self.oauth_state_backend,
            ttl_secs,
            redis_url: self.redis_url.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_organization: "default".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_prefix: DEFAULT_KEY_LABEL.to_string(),
            jwt_secret: None,
            jwt_expiration_hours: 24,
            oauth_state_ttl_secs: DEFAULT_STATE_TTL_SECS,
            oauth_state_backend: OAuthStateBackend::default(),
            redis_url: None,
            oidc: GroupMappingConfig::default(),
            id_token: IdTokenConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `APP__*` variables,
    /// later sources winning
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
