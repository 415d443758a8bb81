//! API Key repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{ApiKey, ApiKeyId};
use crate::domain::DomainError;
use crate::domain::organization::OrganizationId;

/// Repository trait for API key storage
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Get an API key by its ID
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Get an API key by its display prefix (for lookup during authentication)
    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Create a new API key
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError>;

    /// Update an existing API key
    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError>;

    /// Delete an API key
    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;

    /// List every API key
    async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError>;

    /// List keys owned by a user, across organizations
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<ApiKey>, DomainError>;

    /// List keys in an organization
    async fn list_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<ApiKey>, DomainError>;

    /// List keys owned by a user within one organization
    async fn list_by_user_and_organization(
        &self,
        user_id: &str,
        organization_id: &OrganizationId,
    ) -> Result<Vec<ApiKey>, DomainError>;

    /// Record usage of an API key
    async fn record_usage(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Get API keys expiring before a given timestamp
    async fn list_expiring_before(&self, before: DateTime<Utc>) -> Result<Vec<ApiKey>, DomainError>;
}
