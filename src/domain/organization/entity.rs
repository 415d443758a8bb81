//! Organization entity, role templates and memberships

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organization identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Organization (registry namespace)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    id: OrganizationId,
    /// URL-safe unique name
    name: String,
    display_name: String,
    created_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(id: OrganizationId, name: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            id,
            display_name: name.clone(),
            name,
            created_at: Utc::now(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn id(&self) -> &OrganizationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Named, reusable bundle of scopes assignable to a membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTemplate {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub scopes: Vec<String>,
}

impl RoleTemplate {
    pub fn new<I, S>(name: impl Into<String>, display_name: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();

        Self {
            id: name.clone(),
            name,
            display_name: display_name.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// The system role templates every registry starts with
    pub fn predefined() -> Vec<RoleTemplate> {
        vec![
            Self::new(
                "viewer",
                "Viewer",
                [
                    "modules:read",
                    "providers:read",
                    "mirrors:read",
                    "organizations:read",
                    "scm:read",
                ],
            ),
            Self::new(
                "publisher",
                "Publisher",
                [
                    "modules:read",
                    "modules:write",
                    "providers:read",
                    "providers:write",
                    "scm:read",
                ],
            ),
            Self::new(
                "devops",
                "DevOps",
                [
                    "modules:read",
                    "providers:read",
                    "providers:write",
                    "mirrors:read",
                    "mirrors:manage",
                    "scm:read",
                    "scm:manage",
                ],
            ),
            Self::new("admin", "Administrator", ["admin"]),
        ]
    }
}

/// Raw membership of a user in an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub organization_id: OrganizationId,
    pub user_id: String,
    /// Name of the assigned role template, if any
    pub role: Option<String>,
}

/// Membership joined with its role template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberWithRole {
    pub organization_id: OrganizationId,
    pub user_id: String,
    pub role_template: Option<RoleTemplate>,
}

/// Distinct scopes granted by a user's role templates across all of their
/// organizations, sorted
pub fn combined_scopes(memberships: &[MemberWithRole]) -> Vec<String> {
    memberships
        .iter()
        .filter_map(|m| m.role_template.as_ref())
        .flat_map(|t| t.scopes.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scope;

    #[test]
    fn test_predefined_templates_use_catalog_scopes() {
        for template in RoleTemplate::predefined() {
            assert!(
                scope::validate_all(&template.scopes).is_ok(),
                "template {} has unknown scopes",
                template.name
            );
        }
    }

    #[test]
    fn test_admin_template_is_wildcard() {
        let admin = RoleTemplate::predefined()
            .into_iter()
            .find(|t| t.name == "admin")
            .unwrap();

        assert_eq!(admin.scopes, vec!["admin".to_string()]);
    }

    #[test]
    fn test_organization_display_name_defaults_to_name() {
        let org = Organization::new(OrganizationId::new("org-1"), "platform");
        assert_eq!(org.display_name(), "platform");

        let org = org.with_display_name("Platform Team");
        assert_eq!(org.display_name(), "Platform Team");
        assert_eq!(org.name(), "platform");
    }

    fn member(org: &str, template: Option<RoleTemplate>) -> MemberWithRole {
        MemberWithRole {
            organization_id: OrganizationId::new(org),
            user_id: "user-1".to_string(),
            role_template: template,
        }
    }

    #[test]
    fn test_combined_scopes_are_deduplicated_union() {
        let memberships = vec![
            member("a", Some(RoleTemplate::new("r1", "R1", ["modules:read", "modules:write"]))),
            member("b", Some(RoleTemplate::new("r2", "R2", ["modules:read", "mirrors:read"]))),
            member("c", None),
        ];

        assert_eq!(
            combined_scopes(&memberships),
            vec!["mirrors:read", "modules:read", "modules:write"]
        );
    }

    #[test]
    fn test_no_templates_no_scopes() {
        assert!(combined_scopes(&[member("a", None)]).is_empty());
        assert!(combined_scopes(&[]).is_empty());
    }
}
