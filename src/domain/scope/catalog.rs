//! Scope catalog

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A known permission scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "modules:read")]
    ModulesRead,
    #[serde(rename = "modules:write")]
    ModulesWrite,
    #[serde(rename = "providers:read")]
    ProvidersRead,
    #[serde(rename = "providers:write")]
    ProvidersWrite,
    /// View mirror configurations and sync status
    #[serde(rename = "mirrors:read")]
    MirrorsRead,
    /// Create, update, delete mirrors and trigger syncs
    #[serde(rename = "mirrors:manage")]
    MirrorsManage,
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:write")]
    UsersWrite,
    #[serde(rename = "organizations:read")]
    OrganizationsRead,
    #[serde(rename = "organizations:write")]
    OrganizationsWrite,
    #[serde(rename = "scm:read")]
    ScmRead,
    #[serde(rename = "scm:manage")]
    ScmManage,
    /// See and manage every API key, not only your own
    #[serde(rename = "api_keys:manage")]
    ApiKeysManage,
    #[serde(rename = "audit:read")]
    AuditRead,
    /// Universal override, a superset of every other scope
    #[serde(rename = "admin")]
    Admin,
}

impl Scope {
    /// Every scope in the catalog
    pub const ALL: [Scope; 15] = [
        Scope::ModulesRead,
        Scope::ModulesWrite,
        Scope::ProvidersRead,
        Scope::ProvidersWrite,
        Scope::MirrorsRead,
        Scope::MirrorsManage,
        Scope::UsersRead,
        Scope::UsersWrite,
        Scope::OrganizationsRead,
        Scope::OrganizationsWrite,
        Scope::ScmRead,
        Scope::ScmManage,
        Scope::ApiKeysManage,
        Scope::AuditRead,
        Scope::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModulesRead => "modules:read",
            Self::ModulesWrite => "modules:write",
            Self::ProvidersRead => "providers:read",
            Self::ProvidersWrite => "providers:write",
            Self::MirrorsRead => "mirrors:read",
            Self::MirrorsManage => "mirrors:manage",
            Self::UsersRead => "users:read",
            Self::UsersWrite => "users:write",
            Self::OrganizationsRead => "organizations:read",
            Self::OrganizationsWrite => "organizations:write",
            Self::ScmRead => "scm:read",
            Self::ScmManage => "scm:manage",
            Self::ApiKeysManage => "api_keys:manage",
            Self::AuditRead => "audit:read",
            Self::Admin => "admin",
        }
    }

    /// The write/manage scope that implies this read scope, if any
    fn implied_by(&self) -> Option<Scope> {
        match self {
            Self::ModulesRead => Some(Self::ModulesWrite),
            Self::ProvidersRead => Some(Self::ProvidersWrite),
            Self::MirrorsRead => Some(Self::MirrorsManage),
            Self::UsersRead => Some(Self::UsersWrite),
            Self::OrganizationsRead => Some(Self::OrganizationsWrite),
            Self::ScmRead => Some(Self::ScmManage),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| DomainError::invalid_scope(s))
    }
}

/// Check whether a scope string is in the catalog
pub fn is_valid(scope: &str) -> bool {
    scope.parse::<Scope>().is_ok()
}

/// Validate every scope, failing on the first unrecognized entry
pub fn validate_all<S: AsRef<str>>(scopes: &[S]) -> Result<(), DomainError> {
    match scopes.iter().find(|s| !is_valid(s.as_ref())) {
        Some(invalid) => Err(DomainError::invalid_scope(invalid.as_ref())),
        None => Ok(()),
    }
}

/// Runtime permission check against a caller's scopes.
///
/// Matches exactly, treats `admin` as a wildcard, and lets a write/manage
/// scope satisfy the read scope of the same resource class.
pub fn has_scope<S: AsRef<str>>(granted: &[S], required: Scope) -> bool {
    let implied = required.implied_by();

    granted.iter().any(|scope| {
        let scope = scope.as_ref();
        scope == required.as_str()
            || scope == Scope::Admin.as_str()
            || implied.is_some_and(|i| scope == i.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_catalog_scope_is_valid() {
        for scope in Scope::ALL {
            assert!(is_valid(scope.as_str()), "{} should be valid", scope);
        }
    }

    #[test]
    fn test_unknown_scopes_are_invalid() {
        assert!(!is_valid("modules:delete"));
        assert!(!is_valid(""));
        assert!(!is_valid("ADMIN"));
    }

    #[test]
    fn test_validate_all_reports_first_invalid() {
        let result = validate_all(&["modules:read", "bogus", "also-bogus"]);
        match result {
            Err(DomainError::InvalidScope { scope }) => assert_eq!(scope, "bogus"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_all_accepts_empty() {
        let empty: [&str; 0] = [];
        assert!(validate_all(&empty).is_ok());
    }

    #[test]
    fn test_scope_serde_names() {
        let json = serde_json::to_string(&Scope::ApiKeysManage).unwrap();
        assert_eq!(json, "\"api_keys:manage\"");

        let parsed: Scope = serde_json::from_str("\"scm:manage\"").unwrap();
        assert_eq!(parsed, Scope::ScmManage);
    }

    #[test]
    fn test_has_scope_exact_and_admin() {
        assert!(has_scope(&["audit:read"], Scope::AuditRead));
        assert!(has_scope(&["admin"], Scope::ApiKeysManage));
        assert!(!has_scope(&["modules:read"], Scope::ApiKeysManage));
    }

    #[test]
    fn test_has_scope_write_implies_read() {
        assert!(has_scope(&["modules:write"], Scope::ModulesRead));
        assert!(has_scope(&["mirrors:manage"], Scope::MirrorsRead));
        assert!(!has_scope(&["modules:read"], Scope::ModulesWrite));
        assert!(!has_scope(&["providers:write"], Scope::ModulesRead));
    }
}
