//! API Key domain
//!
//! Long-lived credentials scoped to an organization. The plaintext secret is
//! handed out exactly once, at creation or rotation; only a one-way hash and
//! a short display prefix are kept.

mod entity;
mod repository;
mod validation;

pub use entity::{ApiKey, ApiKeyId, ApiKeyView, normalize_scopes};
pub use repository::ApiKeyRepository;
pub use validation::{ApiKeyValidationError, validate_api_key_id, validate_api_key_name};

#[cfg(test)]
pub use repository::mock;
