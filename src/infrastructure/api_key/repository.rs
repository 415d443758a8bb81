//! In-memory API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::organization::OrganizationId;

#[derive(Debug, Default)]
struct Inner {
    keys: HashMap<String, ApiKey>,
    /// display prefix -> key id
    prefix_index: HashMap<String, String>,
}

/// In-memory implementation of ApiKeyRepository
#[derive(Debug, Default, Clone)]
pub struct InMemoryApiKeyRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matching keys, oldest first
    async fn filter<F>(&self, predicate: F) -> Vec<ApiKey>
    where
        F: Fn(&ApiKey) -> bool,
    {
        let inner = self.inner.read().await;
        let mut keys: Vec<ApiKey> = inner
            .keys
            .values()
            .filter(|k| predicate(k))
            .cloned()
            .collect();
        keys.sort_by_key(|k| k.created_at());
        keys
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.keys.get(id.as_str()).cloned())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError> {
        let inner = self.inner.read().await;

        Ok(inner
            .prefix_index
            .get(prefix)
            .and_then(|id| inner.keys.get(id))
            .cloned())
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let mut inner = self.inner.write().await;

        let id = api_key.id().as_str().to_string();
        let prefix = api_key.key_prefix().to_string();

        if inner.keys.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "API key with ID '{}' already exists",
                id
            )));
        }

        if inner.prefix_index.contains_key(&prefix) {
            return Err(DomainError::conflict(format!(
                "API key with prefix '{}' already exists",
                prefix
            )));
        }

        inner.keys.insert(id.clone(), api_key.clone());
        inner.prefix_index.insert(prefix, id);

        Ok(api_key)
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError> {
        let mut inner = self.inner.write().await;
        let id = api_key.id().as_str();

        match inner.keys.get_mut(id) {
            Some(existing) => {
                *existing = api_key.clone();
                Ok(api_key.clone())
            }
            None => Err(DomainError::not_found(format!(
                "API key '{}' not found",
                id
            ))),
        }
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let mut inner = self.inner.write().await;

        match inner.keys.remove(id.as_str()) {
            Some(key) => {
                inner.prefix_index.remove(key.key_prefix());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError> {
        Ok(self.filter(|_| true).await)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<ApiKey>, DomainError> {
        Ok(self.filter(|k| k.is_owned_by(user_id)).await)
    }

    async fn list_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<ApiKey>, DomainError> {
        Ok(self
            .filter(|k| k.organization_id() == organization_id)
            .await)
    }

    async fn list_by_user_and_organization(
        &self,
        user_id: &str,
        organization_id: &OrganizationId,
    ) -> Result<Vec<ApiKey>, DomainError> {
        Ok(self
            .filter(|k| k.is_owned_by(user_id) && k.organization_id() == organization_id)
            .await)
    }

    async fn record_usage(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;

        let key = inner
            .keys
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;
        key.record_usage(at);

        Ok(())
    }

    async fn list_expiring_before(&self, before: DateTime<Utc>) -> Result<Vec<ApiKey>, DomainError> {
        Ok(self
            .filter(|k| k.expires_at().is_some_and(|at| at < before))
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(owner: Option<&str>, org: &str, prefix: &str) -> ApiKey {
        let key = ApiKey::new(
            ApiKeyId::generate(),
            OrganizationId::new(org),
            "Test Key",
            "sha256$hash",
            prefix,
            Utc::now(),
        );

        match owner {
            Some(owner) => key.with_owner(owner),
            None => key,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryApiKeyRepository::new();
        let created = repo
            .create(key(Some("user-1"), "org-1", "tfr_aaaaaaaa"))
            .await
            .unwrap();

        let fetched = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(fetched.id(), created.id());

        let by_prefix = repo.get_by_prefix("tfr_aaaaaaaa").await.unwrap().unwrap();
        assert_eq!(by_prefix.id(), created.id());
    }

    #[tokio::test]
    async fn test_duplicate_prefix_conflicts() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key(None, "org-1", "tfr_aaaaaaaa")).await.unwrap();

        let err = repo
            .create(key(None, "org-1", "tfr_aaaaaaaa"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_delete_clears_prefix_index() {
        let repo = InMemoryApiKeyRepository::new();
        let created = repo.create(key(None, "org-1", "tfr_aaaaaaaa")).await.unwrap();

        assert!(repo.delete(created.id()).await.unwrap());
        assert!(!repo.delete(created.id()).await.unwrap());
        assert!(repo.get_by_prefix("tfr_aaaaaaaa").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_key() {
        let repo = InMemoryApiKeyRepository::new();
        let err = repo
            .update(&key(None, "org-1", "tfr_aaaaaaaa"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = InMemoryApiKeyRepository::new();
        repo.create(key(Some("user-1"), "org-1", "tfr_00000001")).await.unwrap();
        repo.create(key(Some("user-1"), "org-2", "tfr_00000002")).await.unwrap();
        repo.create(key(Some("user-2"), "org-1", "tfr_00000003")).await.unwrap();
        repo.create(key(None, "org-1", "tfr_00000004")).await.unwrap();

        let org1 = OrganizationId::new("org-1");

        assert_eq!(repo.list_all().await.unwrap().len(), 4);
        assert_eq!(repo.list_by_user("user-1").await.unwrap().len(), 2);
        assert_eq!(repo.list_by_organization(&org1).await.unwrap().len(), 3);
        assert_eq!(
            repo.list_by_user_and_organization("user-1", &org1)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_record_usage() {
        let repo = InMemoryApiKeyRepository::new();
        let created = repo.create(key(None, "org-1", "tfr_aaaaaaaa")).await.unwrap();
        let at = Utc::now();

        repo.record_usage(created.id(), at).await.unwrap();

        let fetched = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(fetched.last_used_at(), Some(at));
    }

    #[tokio::test]
    async fn test_list_expiring_before() {
        let repo = InMemoryApiKeyRepository::new();
        let now = Utc::now();

        repo.create(
            key(None, "org-1", "tfr_00000001").with_expiration(Some(now + Duration::hours(1))),
        )
        .await
        .unwrap();
        repo.create(
            key(None, "org-1", "tfr_00000002").with_expiration(Some(now + Duration::days(30))),
        )
        .await
        .unwrap();
        repo.create(key(None, "org-1", "tfr_00000003")).await.unwrap();

        let expiring = repo
            .list_expiring_before(now + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].key_prefix(), "tfr_00000001");
    }
}
