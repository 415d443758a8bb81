//! In-memory organization and membership repository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::organization::{
    MemberWithRole, Membership, Organization, OrganizationId, OrganizationRepository,
    RoleTemplate,
};

type MemberKey = (OrganizationId, String);

#[derive(Debug, Default)]
struct Inner {
    organizations: HashMap<OrganizationId, Organization>,
    default_organization: Option<OrganizationId>,
    /// role template name -> template
    role_templates: HashMap<String, RoleTemplate>,
    /// (org, user) -> role template name
    members: HashMap<MemberKey, Option<String>>,
}

/// In-memory implementation of OrganizationRepository.
///
/// Starts with the predefined role templates and no organizations.
#[derive(Debug, Clone)]
pub struct InMemoryOrganizationRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrganizationRepository {
    pub fn new() -> Self {
        Self::from_inner(Inner::default())
    }

    /// Repository seeded with a default organization named `name`
    pub fn with_default_organization(name: &str) -> Self {
        let org = Organization::new(OrganizationId::new(Uuid::new_v4().to_string()), name);

        Self::from_inner(Inner {
            default_organization: Some(org.id().clone()),
            organizations: HashMap::from([(org.id().clone(), org)]),
            ..Default::default()
        })
    }

    fn from_inner(mut inner: Inner) -> Self {
        inner.role_templates = RoleTemplate::predefined()
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub async fn add_organization(&self, organization: Organization) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;

        if inner
            .organizations
            .values()
            .any(|o| o.name() == organization.name())
        {
            return Err(DomainError::conflict(format!(
                "Organization '{}' already exists",
                organization.name()
            )));
        }

        inner
            .organizations
            .insert(organization.id().clone(), organization);
        Ok(())
    }

    pub async fn add_role_template(&self, template: RoleTemplate) {
        let mut inner = self.inner.write().await;
        inner.role_templates.insert(template.name.clone(), template);
    }

    /// Add a member with no role template assigned
    pub async fn add_member_without_role(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        Self::ensure_organization(&inner, organization_id)?;

        inner
            .members
            .insert((organization_id.clone(), user_id.to_string()), None);
        Ok(())
    }

    fn ensure_organization(inner: &Inner, id: &OrganizationId) -> Result<(), DomainError> {
        if inner.organizations.contains_key(id) {
            Ok(())
        } else {
            Err(DomainError::not_found(format!(
                "Organization '{}' not found",
                id
            )))
        }
    }

    fn ensure_role_template(inner: &Inner, role: &str) -> Result<(), DomainError> {
        if inner.role_templates.contains_key(role) {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "Unknown role template '{}'",
                role
            )))
        }
    }
}

impl Default for InMemoryOrganizationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn get_default_organization(&self) -> Result<Option<Organization>, DomainError> {
        let inner = self.inner.read().await;

        Ok(inner
            .default_organization
            .as_ref()
            .and_then(|id| inner.organizations.get(id))
            .cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Organization>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .organizations
            .values()
            .find(|o| o.name() == name)
            .cloned())
    }

    async fn get_member_with_role(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
    ) -> Result<Option<MemberWithRole>, DomainError> {
        let inner = self.inner.read().await;
        let key = (organization_id.clone(), user_id.to_string());

        Ok(inner.members.get(&key).map(|role| MemberWithRole {
            organization_id: organization_id.clone(),
            user_id: user_id.to_string(),
            role_template: role
                .as_ref()
                .and_then(|name| inner.role_templates.get(name))
                .cloned(),
        }))
    }

    async fn list_user_memberships(&self, user_id: &str) -> Result<Vec<MemberWithRole>, DomainError> {
        let inner = self.inner.read().await;

        let mut memberships: Vec<MemberWithRole> = inner
            .members
            .iter()
            .filter(|((_, member), _)| member == user_id)
            .map(|((organization_id, _), role)| MemberWithRole {
                organization_id: organization_id.clone(),
                user_id: user_id.to_string(),
                role_template: role
                    .as_ref()
                    .and_then(|name| inner.role_templates.get(name))
                    .cloned(),
            })
            .collect();
        memberships.sort_by(|a, b| a.organization_id.cmp(&b.organization_id));

        Ok(memberships)
    }

    async fn check_membership(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
    ) -> Result<Option<Membership>, DomainError> {
        let inner = self.inner.read().await;
        let key = (organization_id.clone(), user_id.to_string());

        Ok(inner.members.get(&key).map(|role| Membership {
            organization_id: organization_id.clone(),
            user_id: user_id.to_string(),
            role: role.clone(),
        }))
    }

    async fn add_member(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
        role: &str,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        Self::ensure_organization(&inner, organization_id)?;
        Self::ensure_role_template(&inner, role)?;

        let key = (organization_id.clone(), user_id.to_string());
        if inner.members.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "User '{}' is already a member of organization '{}'",
                user_id, organization_id
            )));
        }

        inner.members.insert(key, Some(role.to_string()));
        Ok(())
    }

    async fn update_member_role(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
        role: &str,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        Self::ensure_role_template(&inner, role)?;

        let key = (organization_id.clone(), user_id.to_string());
        match inner.members.get_mut(&key) {
            Some(existing) => {
                *existing = Some(role.to_string());
                Ok(())
            }
            None => Err(DomainError::not_found(format!(
                "User '{}' is not a member of organization '{}'",
                user_id, organization_id
            ))),
        }
    }
}
