//! Application state for HTTP handlers

use std::sync::Arc;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyView};
use crate::domain::organization::{OrganizationId, OrganizationRepository};
use crate::domain::{Caller, DomainError, OAuthStateStore};
use crate::infrastructure::api_key::{
    ApiKeyService, CreateApiKeyRequest, CreatedApiKey, RotationResult, UpdateApiKeyRequest,
};
use crate::infrastructure::auth::{IdTokenVerifier, JwtGenerator};
use crate::infrastructure::group_mapping::{GroupRoleResolver, InMemoryGroupMappingSource};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub api_key_service: Arc<dyn ApiKeyServiceTrait>,
    pub jwt_service: Arc<dyn JwtGenerator>,
    pub oauth_states: Arc<dyn OAuthStateStore>,
    /// Absent when no identity provider is configured; login is then refused
    pub id_tokens: Option<Arc<dyn IdTokenVerifier>>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub group_roles: Arc<GroupRoleResolver>,
    /// Stored group mapping configuration, editable at runtime
    pub group_mappings: Arc<InMemoryGroupMappingSource>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_service", &self.jwt_service)
            .field("oauth_states", &self.oauth_states)
            .field("id_tokens", &self.id_tokens)
            .field("group_roles", &self.group_roles)
            .finish_non_exhaustive()
    }
}

/// API key operations as seen by handlers; ids arrive as raw path strings
#[async_trait::async_trait]
pub trait ApiKeyServiceTrait: Send + Sync {
    async fn create(
        &self,
        caller: &Caller,
        request: CreateApiKeyRequest,
    ) -> Result<CreatedApiKey, DomainError>;
    async fn get(&self, caller: &Caller, id: &str) -> Result<ApiKeyView, DomainError>;
    async fn update(
        &self,
        caller: &Caller,
        id: &str,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKeyView, DomainError>;
    async fn delete(&self, caller: &Caller, id: &str) -> Result<(), DomainError>;
    async fn rotate(
        &self,
        caller: &Caller,
        id: &str,
        grace_period_hours: i64,
    ) -> Result<RotationResult, DomainError>;
    async fn list(
        &self,
        caller: &Caller,
        organization_id: Option<&str>,
    ) -> Result<Vec<ApiKeyView>, DomainError>;
    /// Resolve a presented secret to the identity it acts as
    async fn authenticate(&self, secret: &str) -> Result<Option<Caller>, DomainError>;
}

/// A malformed id can never name a stored key
fn parse_key_id(id: &str) -> Result<ApiKeyId, DomainError> {
    ApiKeyId::new(id).map_err(|_| DomainError::not_found(format!("API key '{}' not found", id)))
}

fn caller_for_key(key: &ApiKey) -> Caller {
    let user_id = key
        .owner_user_id()
        .map(String::from)
        .unwrap_or_else(|| format!("apikey:{}", key.id()));

    Caller::new(user_id, key.scopes().to_vec())
}

#[async_trait::async_trait]
impl<R: ApiKeyRepository + 'static> ApiKeyServiceTrait for ApiKeyService<R> {
    async fn create(
        &self,
        caller: &Caller,
        request: CreateApiKeyRequest,
    ) -> Result<CreatedApiKey, DomainError> {
        ApiKeyService::create(self, caller, request).await
    }

    async fn get(&self, caller: &Caller, id: &str) -> Result<ApiKeyView, DomainError> {
        ApiKeyService::get(self, caller, &parse_key_id(id)?).await
    }

    async fn update(
        &self,
        caller: &Caller,
        id: &str,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKeyView, DomainError> {
        ApiKeyService::update(self, caller, &parse_key_id(id)?, request).await
    }

    async fn delete(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        ApiKeyService::delete(self, caller, &parse_key_id(id)?).await
    }

    async fn rotate(
        &self,
        caller: &Caller,
        id: &str,
        grace_period_hours: i64,
    ) -> Result<RotationResult, DomainError> {
        ApiKeyService::rotate(self, caller, &parse_key_id(id)?, grace_period_hours).await
    }

    async fn list(
        &self,
        caller: &Caller,
        organization_id: Option<&str>,
    ) -> Result<Vec<ApiKeyView>, DomainError> {
        let organization_id = organization_id
            .filter(|id| !id.is_empty())
            .map(OrganizationId::new);

        ApiKeyService::list(self, caller, organization_id.as_ref()).await
    }

    async fn authenticate(&self, secret: &str) -> Result<Option<Caller>, DomainError> {
        let key = ApiKeyService::authenticate(self, secret).await?;
        Ok(key.as_ref().map(caller_for_key))
    }
}
