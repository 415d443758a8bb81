//! Authenticated caller identity

use super::scope::{self, Scope};

/// The identity an operation runs on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    /// Scopes granted by the caller's session or API key
    pub scopes: Vec<String>,
}

impl Caller {
    pub fn new<I, S>(user_id: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: user_id.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_scope(&self, required: Scope) -> bool {
        scope::has_scope(&self.scopes, required)
    }

    pub fn is_admin(&self) -> bool {
        self.has_scope(Scope::Admin)
    }

    /// Whether the caller may see and manage every API key
    pub fn can_manage_api_keys(&self) -> bool {
        self.has_scope(Scope::ApiKeysManage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_can_manage_keys() {
        let caller = Caller::new("user-1", ["admin"]);
        assert!(caller.is_admin());
        assert!(caller.can_manage_api_keys());
    }

    #[test]
    fn test_plain_caller() {
        let caller = Caller::new("user-1", ["modules:read"]);
        assert!(!caller.is_admin());
        assert!(!caller.can_manage_api_keys());
        assert!(caller.has_scope(Scope::ModulesRead));
    }
}
