//! Organization and membership repository trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{MemberWithRole, Membership, Organization, OrganizationId};
use crate::domain::DomainError;

/// Membership store consumed by the API key lifecycle and the group role
/// resolver
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// The registry's configured default organization, if any
    async fn get_default_organization(&self) -> Result<Option<Organization>, DomainError>;

    /// Find an organization by its unique name
    async fn get_by_name(&self, name: &str) -> Result<Option<Organization>, DomainError>;

    /// Membership of `user_id` in `organization_id`, joined with its role
    /// template's scopes
    async fn get_member_with_role(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
    ) -> Result<Option<MemberWithRole>, DomainError>;

    /// Every membership of `user_id`, each joined with its role template
    async fn list_user_memberships(&self, user_id: &str) -> Result<Vec<MemberWithRole>, DomainError>;

    /// Raw membership row, without resolving the role template
    async fn check_membership(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
    ) -> Result<Option<Membership>, DomainError>;

    /// Add a member with the named role template
    async fn add_member(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
        role: &str,
    ) -> Result<(), DomainError>;

    /// Replace an existing member's role template
    async fn update_member_role(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
        role: &str,
    ) -> Result<(), DomainError>;
}
