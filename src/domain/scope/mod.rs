//! Permission scopes
//!
//! The scope catalog enumerates every permission string the registry knows,
//! and the role scope guard decides whether a set of requested scopes fits
//! inside the scopes granted by a caller's role template.

mod catalog;
mod guard;

pub use catalog::{Scope, has_scope, is_valid, validate_all};
pub use guard::{ScopeDecision, authorize};
