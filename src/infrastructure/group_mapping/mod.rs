//! Group mapping infrastructure
//!
//! The swappable dynamic configuration handle and the resolver that turns
//! identity provider groups into organization memberships.

mod resolver;
mod source;

pub use resolver::{
    AppliedAssignment, GroupRoleResolver, MembershipChange, Resolution, groups_from_claims,
};
pub use source::InMemoryGroupMappingSource;

#[cfg(test)]
pub use source::FailingGroupMappingSource;
