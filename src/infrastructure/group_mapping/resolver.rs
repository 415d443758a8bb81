//! Group role resolver
//!
//! Resolves identity provider group claims into organization role
//! assignments and upserts the matching memberships.
//!
//! The stored (dynamic) configuration wins over the static one when any of
//! its fields is set, and then it is used as a whole: claim name, mappings
//! and default role never mix across the two sources.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::DomainError;
use crate::domain::group_mapping::{
    AssignmentSource, GroupMappingConfig, GroupMappingSource, RoleAssignment,
};
use crate::domain::organization::OrganizationRepository;

/// Outcome of resolving a set of groups, before anything is written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Memberships to upsert, in mapping order
    pub assignments: Vec<RoleAssignment>,
    /// Mapped organizations that do not exist
    pub missing_organizations: Vec<String>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// The assignment that ends up in effect last, as `(organization, role)`
    pub fn last(&self) -> Option<(&str, &str)> {
        self.assignments
            .last()
            .map(|a| (a.organization_id.as_str(), a.role.as_str()))
    }
}

/// What applying an assignment did to the membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipChange {
    Added,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedAssignment {
    #[serde(flatten)]
    pub assignment: RoleAssignment,
    pub change: MembershipChange,
}

/// Resolves group claims against the effective mapping configuration
pub struct GroupRoleResolver {
    organizations: Arc<dyn OrganizationRepository>,
    dynamic: Option<Arc<dyn GroupMappingSource>>,
    static_config: GroupMappingConfig,
}

impl std::fmt::Debug for GroupRoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupRoleResolver")
            .field("dynamic", &self.dynamic)
            .field("static_config", &self.static_config)
            .finish_non_exhaustive()
    }
}

impl GroupRoleResolver {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        static_config: GroupMappingConfig,
    ) -> Self {
        Self {
            organizations,
            dynamic: None,
            static_config,
        }
    }

    pub fn with_dynamic_source(mut self, source: Arc<dyn GroupMappingSource>) -> Self {
        self.dynamic = Some(source);
        self
    }

    /// The single configuration in effect right now
    pub async fn effective_config(&self) -> GroupMappingConfig {
        if let Some(source) = &self.dynamic {
            match source.active().await {
                Ok(Some(config)) if config.is_configured() => return config,
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        error = %e,
                        "Failed to read stored group mapping configuration, using static configuration"
                    );
                }
            }
        }

        self.static_config.clone()
    }

    /// Claim to read groups from, taken from the effective configuration
    pub async fn group_claim_name(&self) -> String {
        self.effective_config().await.group_claim_name
    }

    /// Work out which memberships `groups` should produce.
    ///
    /// A mapping whose organization is missing is skipped with a warning.
    /// When nothing matches and a default role is configured, the default
    /// organization must exist.
    pub async fn resolve<S: AsRef<str>>(&self, groups: &[S]) -> Result<Resolution, DomainError> {
        let config = self.effective_config().await;
        self.resolve_with(&config, groups).await
    }

    async fn resolve_with<S: AsRef<str>>(
        &self,
        config: &GroupMappingConfig,
        groups: &[S],
    ) -> Result<Resolution, DomainError> {
        let mut resolution = Resolution::default();

        if !config.has_rules() {
            return Ok(resolution);
        }

        let group_set: HashSet<&str> = groups.iter().map(AsRef::as_ref).collect();
        let mut matched = false;

        for mapping in &config.group_mappings {
            if !group_set.contains(mapping.group.as_str()) {
                continue;
            }
            matched = true;

            match self.organizations.get_by_name(&mapping.organization).await? {
                Some(org) => resolution.assignments.push(RoleAssignment {
                    organization_id: org.id().clone(),
                    organization_name: org.name().to_string(),
                    role: mapping.role.clone(),
                    source: AssignmentSource::Mapping {
                        group: mapping.group.clone(),
                    },
                }),
                None => {
                    warn!(
                        group = %mapping.group,
                        organization = %mapping.organization,
                        "Group mapping organization not found"
                    );
                    resolution
                        .missing_organizations
                        .push(mapping.organization.clone());
                }
            }
        }

        if let (false, Some(default_role)) = (matched, config.default_role()) {
            let org = self
                .organizations
                .get_default_organization()
                .await?
                .ok_or_else(|| {
                    DomainError::default_org_unavailable(
                        "Default organization not found for default role fallback",
                    )
                })?;

            resolution.assignments.push(RoleAssignment {
                organization_id: org.id().clone(),
                organization_name: org.name().to_string(),
                role: default_role.to_string(),
                source: AssignmentSource::DefaultRole,
            });
        }

        Ok(resolution)
    }

    /// Resolve `groups` and upsert the resulting memberships for `user_id`.
    ///
    /// Organizations not named by the configuration are never touched.
    pub async fn apply<S: AsRef<str>>(
        &self,
        user_id: &str,
        groups: &[S],
    ) -> Result<Vec<AppliedAssignment>, DomainError> {
        let resolution = self.resolve(groups).await?;
        let mut applied = Vec::with_capacity(resolution.assignments.len());

        for assignment in resolution.assignments {
            let org = &assignment.organization_id;

            let change = match self.organizations.check_membership(org, user_id).await? {
                Some(existing) if existing.role.as_deref() == Some(assignment.role.as_str()) => {
                    MembershipChange::Unchanged
                }
                Some(_) => {
                    self.organizations
                        .update_member_role(org, user_id, &assignment.role)
                        .await?;
                    MembershipChange::Updated
                }
                None => {
                    self.organizations
                        .add_member(org, user_id, &assignment.role)
                        .await?;
                    MembershipChange::Added
                }
            };

            if change == MembershipChange::Unchanged {
                debug!(
                    user_id = %user_id,
                    organization = %assignment.organization_name,
                    "Group role already in place"
                );
            } else {
                info!(
                    user_id = %user_id,
                    organization = %assignment.organization_name,
                    role = %assignment.role,
                    change = ?change,
                    "Group role applied"
                );
            }

            applied.push(AppliedAssignment { assignment, change });
        }

        Ok(applied)
    }
}

/// Read group names from a claim set.
///
/// Accepts an array of strings or a single string; anything else, or an
/// empty claim name, yields no groups.
pub fn groups_from_claims(claims: &Value, claim_name: &str) -> Vec<String> {
    if claim_name.is_empty() {
        return Vec::new();
    }

    match claims.get(claim_name) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(group)) if !group.is_empty() => vec![group.clone()],
        _ => Vec::new(),
    }
}
