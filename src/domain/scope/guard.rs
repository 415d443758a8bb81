//! Role scope guard
//!
//! Decides whether requested scopes stay within the scopes a caller's role
//! template grants. Pure and side-effect free.

use std::collections::HashSet;

use super::catalog::Scope;

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    Allowed,
    /// The first requested scope, in request order, missing from the grant
    Denied { violating_scope: String },
}

impl ScopeDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Check `requested` against `granted`.
///
/// A grant containing `admin` allows anything. Otherwise every requested
/// scope must appear in the grant.
pub fn authorize<G, R>(granted: &[G], requested: &[R]) -> ScopeDecision
where
    G: AsRef<str>,
    R: AsRef<str>,
{
    if granted.iter().any(|s| s.as_ref() == Scope::Admin.as_str()) {
        return ScopeDecision::Allowed;
    }

    let allowed: HashSet<&str> = granted.iter().map(|s| s.as_ref()).collect();

    match requested.iter().find(|s| !allowed.contains(s.as_ref())) {
        Some(scope) => ScopeDecision::Denied {
            violating_scope: scope.as_ref().to_string(),
        },
        None => ScopeDecision::Allowed,
    }
}
