//! Atomically replaceable group mapping configuration

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::DomainError;
use crate::domain::group_mapping::{GroupMappingConfig, GroupMappingSource};

/// Holds the dynamically stored configuration.
///
/// Readers always see one whole configuration; `replace` swaps it in a
/// single step.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGroupMappingSource {
    current: Arc<RwLock<Option<Arc<GroupMappingConfig>>>>,
}

impl InMemoryGroupMappingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GroupMappingConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Some(Arc::new(config)))),
        }
    }

    /// Swap in a new configuration, returning the previous one
    pub async fn replace(&self, config: GroupMappingConfig) -> Option<Arc<GroupMappingConfig>> {
        let mappings = config.group_mappings.len();
        let previous = self.current.write().await.replace(Arc::new(config));

        info!(mappings, "Group mapping configuration replaced");
        previous
    }

    pub async fn clear(&self) -> Option<Arc<GroupMappingConfig>> {
        self.current.write().await.take()
    }
}

#[async_trait]
impl GroupMappingSource for InMemoryGroupMappingSource {
    async fn active(&self) -> Result<Option<GroupMappingConfig>, DomainError> {
        Ok(self
            .current
            .read()
            .await
            .as_ref()
            .map(|config| config.as_ref().clone()))
    }
}

/// Source whose backing store is unreachable
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingGroupMappingSource;

#[cfg(test)]
#[async_trait]
impl GroupMappingSource for FailingGroupMappingSource {
    async fn active(&self) -> Result<Option<GroupMappingConfig>, DomainError> {
        Err(DomainError::storage("group mapping store unreachable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::group_mapping::GroupMapping;

    #[tokio::test]
    async fn test_empty_source() {
        let source = InMemoryGroupMappingSource::new();
        assert!(source.active().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_config() {
        let source = InMemoryGroupMappingSource::with_config(
            GroupMappingConfig::new("groups").with_default_role("viewer"),
        );

        let previous = source
            .replace(
                GroupMappingConfig::new("roles")
                    .with_mapping(GroupMapping::new("ops", "infra", "devops")),
            )
            .await
            .unwrap();
        assert_eq!(previous.group_claim_name, "groups");

        let active = source.active().await.unwrap().unwrap();
        assert_eq!(active.group_claim_name, "roles");
        assert_eq!(active.group_mappings.len(), 1);
        assert_eq!(active.default_role(), None);
    }

    #[tokio::test]
    async fn test_clear() {
        let source = InMemoryGroupMappingSource::with_config(GroupMappingConfig::new("groups"));
        assert!(source.clear().await.is_some());
        assert!(source.active().await.unwrap().is_none());
    }
}
