use thiserror::Error;

/// Broad classification of a [`DomainError`], used by transports to pick a
/// status and by callers to decide whether details may be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed client input, never retried
    Client,
    /// The caller is identified but not allowed to do this
    Authorization,
    /// No such key or organization
    NotFound,
    /// Server-side fault; details are logged, not surfaced
    Server,
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid ID format: {message}")]
    InvalidId { message: String },

    #[error("Invalid scope: {scope}")]
    InvalidScope { scope: String },

    #[error("Invalid expires_at '{value}': use RFC3339")]
    InvalidExpiry { value: String },

    #[error("Grace period must be between 0 and {max_hours} hours, got {hours}")]
    InvalidGracePeriod { hours: i64, max_hours: i64 },

    #[error("You are not a member of organization '{organization_id}'")]
    NotAMember { organization_id: String },

    #[error(
        "No role template assigned for organization '{organization_id}'. Contact an administrator to assign a role."
    )]
    NoRoleAssigned { organization_id: String },

    #[error("Scope '{scope}' exceeds your role permissions for this organization")]
    ScopeExceedsRole {
        scope: String,
        allowed_scopes: Vec<String>,
        role_template: String,
    },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Default organization unavailable: {message}")]
    DefaultOrgUnavailable { message: String },

    #[error("Credential generation failed: {message}")]
    CredentialGeneration { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    pub fn invalid_scope(scope: impl Into<String>) -> Self {
        Self::InvalidScope {
            scope: scope.into(),
        }
    }

    pub fn invalid_expiry(value: impl Into<String>) -> Self {
        Self::InvalidExpiry {
            value: value.into(),
        }
    }

    pub fn invalid_grace_period(hours: i64, max_hours: i64) -> Self {
        Self::InvalidGracePeriod { hours, max_hours }
    }

    pub fn not_a_member(organization_id: impl Into<String>) -> Self {
        Self::NotAMember {
            organization_id: organization_id.into(),
        }
    }

    pub fn no_role_assigned(organization_id: impl Into<String>) -> Self {
        Self::NoRoleAssigned {
            organization_id: organization_id.into(),
        }
    }

    pub fn scope_exceeds_role(
        scope: impl Into<String>,
        allowed_scopes: Vec<String>,
        role_template: impl Into<String>,
    ) -> Self {
        Self::ScopeExceedsRole {
            scope: scope.into(),
            allowed_scopes,
            role_template: role_template.into(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    pub fn default_org_unavailable(message: impl Into<String>) -> Self {
        Self::DefaultOrgUnavailable {
            message: message.into(),
        }
    }

    pub fn credential_generation(message: impl Into<String>) -> Self {
        Self::CredentialGeneration {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Classify this error for transport mapping
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. }
            | Self::InvalidId { .. }
            | Self::InvalidScope { .. }
            | Self::InvalidExpiry { .. }
            | Self::InvalidGracePeriod { .. }
            | Self::Conflict { .. } => ErrorKind::Client,
            Self::NotAMember { .. }
            | Self::NoRoleAssigned { .. }
            | Self::ScopeExceedsRole { .. }
            | Self::AccessDenied { .. } => ErrorKind::Authorization,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DefaultOrgUnavailable { .. }
            | Self::CredentialGeneration { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. }
            | Self::Storage { .. } => ErrorKind::Server,
        }
    }
}
