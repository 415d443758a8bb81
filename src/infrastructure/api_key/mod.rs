//! API Key infrastructure implementations
//!
//! Credential generation, in-memory storage and the key lifecycle service.

mod generator;
mod repository;
mod service;

pub use generator::{GeneratedCredential, KeyCredentialFactory, hash_secret};
pub use repository::InMemoryApiKeyRepository;
pub use service::{
    ApiKeyService, CreateApiKeyRequest, CreatedApiKey, DEFAULT_KEY_LABEL,
    DEFAULT_ORGANIZATION_ALIAS, MAX_GRACE_PERIOD_HOURS, OldKeyDisposition, RotationResult,
    UpdateApiKeyRequest,
};
