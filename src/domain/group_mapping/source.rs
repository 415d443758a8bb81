use async_trait::async_trait;
use std::fmt::Debug;

use super::config::GroupMappingConfig;
use crate::domain::DomainError;

/// Dynamically stored group mapping configuration
#[async_trait]
pub trait GroupMappingSource: Send + Sync + Debug {
    /// The currently active configuration, if one has been stored
    async fn active(&self) -> Result<Option<GroupMappingConfig>, DomainError>;
}
