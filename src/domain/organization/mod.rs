//! Organization domain
//!
//! Organizations are the authorization boundary for API keys. A user's
//! membership in an organization carries at most one role template, and
//! that template's scopes cap what the user may mint or broaden.

mod entity;
mod repository;

pub use entity::{
    MemberWithRole, Membership, Organization, OrganizationId, RoleTemplate, combined_scopes,
};
pub use repository::OrganizationRepository;

#[cfg(test)]
pub use repository::MockOrganizationRepository;
