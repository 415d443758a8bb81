//! Domain layer - Core business logic and entities

pub mod api_key;
pub mod caller;
pub mod clock;
pub mod error;
pub mod group_mapping;
pub mod oauth;
pub mod organization;
pub mod random;
pub mod scope;

pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyValidationError, ApiKeyView};
pub use caller::Caller;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, ErrorKind};
pub use group_mapping::{
    AssignmentSource, GroupMapping, GroupMappingConfig, GroupMappingSource, RoleAssignment,
};
pub use oauth::{OAuthPendingState, OAuthStateStore, ProviderType};
pub use organization::{
    MemberWithRole, Membership, Organization, OrganizationId, OrganizationRepository,
    RoleTemplate,
};
pub use random::RandomSource;
pub use scope::{Scope, ScopeDecision};
