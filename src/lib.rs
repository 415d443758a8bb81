//! Registry access core
//!
//! Authorization and credential lifecycle for a package registry:
//! - API key issuance, scoping and rotation
//! - Role-scoped permission checks
//! - Single-use OAuth login state
//! - Identity provider group to organization role mapping

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::{
    api_key::{ApiKeyService, InMemoryApiKeyRepository, KeyCredentialFactory},
    auth::{IdTokenVerifier, JwtConfig, JwtIdTokenVerifier, JwtService},
    group_mapping::{GroupRoleResolver, InMemoryGroupMappingSource},
    oauth::create_oauth_state_store,
    organization::InMemoryOrganizationRepository,
};
use rand::Rng;
use tracing::{info, warn};

/// Create the application state from configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    KeyCredentialFactory::validate_label(&config.auth.api_key_prefix)?;

    let organizations = Arc::new(InMemoryOrganizationRepository::with_default_organization(
        &config.registry.default_organization,
    ));
    info!(
        default_organization = %config.registry.default_organization,
        "Organization store ready"
    );

    let api_key_service = ApiKeyService::new(
        Arc::new(InMemoryApiKeyRepository::new()),
        organizations.clone(),
    )
    .with_key_label(config.auth.api_key_prefix.clone());

    let jwt_service = JwtService::new(JwtConfig::new(
        resolve_jwt_secret(config),
        config.auth.jwt_expiration_hours,
    ))?;

    let oauth_states = create_oauth_state_store(&config.auth.oauth_state_store()).await?;

    let id_tokens: Option<Arc<dyn IdTokenVerifier>> = if config.auth.id_token.is_configured() {
        let verifier = JwtIdTokenVerifier::new(&config.auth.id_token)?;
        info!(issuer = %config.auth.id_token.issuer, "ID token verification enabled");
        Some(Arc::new(verifier))
    } else {
        warn!("No identity provider configured; the login callback will refuse every request");
        None
    };

    let group_mappings = Arc::new(InMemoryGroupMappingSource::new());
    let group_roles = GroupRoleResolver::new(organizations.clone(), config.auth.oidc.clone())
        .with_dynamic_source(group_mappings.clone());

    if config.auth.oidc.is_configured() {
        info!(
            mappings = config.auth.oidc.group_mappings.len(),
            "Static group mapping configuration loaded"
        );
    }

    Ok(AppState {
        api_key_service: Arc::new(api_key_service),
        jwt_service: Arc::new(jwt_service),
        oauth_states,
        id_tokens,
        organizations,
        group_roles: Arc::new(group_roles),
        group_mappings,
    })
}

/// Secret from config, then `JWT_SECRET`, then a random one
fn resolve_jwt_secret(config: &AppConfig) -> String {
    config
        .auth
        .jwt_secret
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| {
            warn!(
                "No JWT secret configured. Generating a random one; \
                sessions will not survive a restart."
            );
            generate_random_secret()
        })
}

fn generate_random_secret() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
