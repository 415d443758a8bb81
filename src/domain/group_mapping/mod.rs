//! Identity provider group to organization role mapping

mod config;
mod source;

pub use config::{AssignmentSource, GroupMapping, GroupMappingConfig, RoleAssignment};
pub use source::GroupMappingSource;
