use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::organization::OrganizationId;

/// Maps one identity provider group to an organization and role template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMapping {
    pub group: String,
    /// Organization name, resolved at apply time
    pub organization: String,
    pub role: String,
}

impl GroupMapping {
    pub fn new(
        group: impl Into<String>,
        organization: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            organization: organization.into(),
            role: role.into(),
        }
    }
}

/// One coherent group mapping configuration.
///
/// Claim name, mappings and default role always come from the same source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMappingConfig {
    /// Token claim holding the user's groups, e.g. `groups`
    #[serde(default)]
    pub group_claim_name: String,
    /// Mappings, applied in declared order
    #[serde(default)]
    pub group_mappings: Vec<GroupMapping>,
    /// Role assigned in the default organization when no mapping matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_role: Option<String>,
}

impl GroupMappingConfig {
    pub fn new(group_claim_name: impl Into<String>) -> Self {
        Self {
            group_claim_name: group_claim_name.into(),
            ..Default::default()
        }
    }

    pub fn with_mapping(mut self, mapping: GroupMapping) -> Self {
        self.group_mappings.push(mapping);
        self
    }

    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = Some(role.into());
        self
    }

    /// Default role, treating an empty string as unset
    pub fn default_role(&self) -> Option<&str> {
        self.default_role.as_deref().filter(|r| !r.is_empty())
    }

    /// Whether any field carries a value
    pub fn is_configured(&self) -> bool {
        !self.group_claim_name.is_empty()
            || !self.group_mappings.is_empty()
            || self.default_role().is_some()
    }

    /// Whether applying this configuration can change anything
    pub fn has_rules(&self) -> bool {
        !self.group_mappings.is_empty() || self.default_role().is_some()
    }

    /// Reject mappings with blank fields
    pub fn validate(&self) -> Result<(), DomainError> {
        for (index, mapping) in self.group_mappings.iter().enumerate() {
            if mapping.group.trim().is_empty()
                || mapping.organization.trim().is_empty()
                || mapping.role.trim().is_empty()
            {
                return Err(DomainError::validation(format!(
                    "Group mapping #{} needs a group, an organization and a role",
                    index + 1
                )));
            }
        }

        Ok(())
    }
}

/// Why a role was assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssignmentSource {
    /// A configured mapping matched this group
    Mapping { group: String },
    /// No mapping matched; the default role applies
    DefaultRole,
}

/// A membership the resolver wants to exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleAssignment {
    pub organization_id: OrganizationId,
    pub organization_name: String,
    pub role: String,
    pub source: AssignmentSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_not_configured() {
        assert!(!GroupMappingConfig::default().is_configured());
        assert!(
            !GroupMappingConfig {
                default_role: Some(String::new()),
                ..Default::default()
            }
            .is_configured()
        );
    }

    #[test]
    fn test_any_field_makes_config_configured() {
        assert!(GroupMappingConfig::new("groups").is_configured());
        assert!(
            GroupMappingConfig::default()
                .with_default_role("viewer")
                .is_configured()
        );
        assert!(
            GroupMappingConfig::default()
                .with_mapping(GroupMapping::new("devs", "platform", "publisher"))
                .is_configured()
        );
    }

    #[test]
    fn test_claim_name_alone_has_no_rules() {
        let config = GroupMappingConfig::new("groups");
        assert!(config.is_configured());
        assert!(!config.has_rules());
    }

    #[test]
    fn test_validate_rejects_blank_mapping_fields() {
        let valid = GroupMappingConfig::new("groups")
            .with_mapping(GroupMapping::new("ops", "infra", "devops"));
        assert!(valid.validate().is_ok());

        let invalid = valid.with_mapping(GroupMapping::new("devs", " ", "viewer"));
        assert!(matches!(
            invalid.validate(),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn test_deserialize_partial_document() {
        let config: GroupMappingConfig =
            serde_json::from_str(r#"{"group_mappings":[{"group":"ops","organization":"infra","role":"devops"}]}"#)
                .unwrap();

        assert_eq!(config.group_claim_name, "");
        assert_eq!(config.group_mappings.len(), 1);
        assert_eq!(config.default_role(), None);
    }
}
