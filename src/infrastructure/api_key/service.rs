//! API Key service
//!
//! Create, read, update, delete and rotate API keys. Every operation that
//! mints or broadens scopes is checked against the caller's role template in
//! the key's organization.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::api_key::{
    ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyView, validate_api_key_name,
};
use crate::domain::organization::{OrganizationId, OrganizationRepository};
use crate::domain::scope::{self, ScopeDecision};
use crate::domain::{Caller, Clock, DomainError, SystemClock};

use super::generator::KeyCredentialFactory;

/// Label every minted secret starts with
pub const DEFAULT_KEY_LABEL: &str = "tfr";

/// Upper bound for the rotation grace period
pub const MAX_GRACE_PERIOD_HOURS: i64 = 72;

/// Organization id that stands for the registry's default organization
pub const DEFAULT_ORGANIZATION_ALIAS: &str = "default";

const ROTATED_NAME_SUFFIX: &str = " (rotated)";

/// Request to create an API key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Target organization; empty or `default` selects the default one
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC 3339 timestamp
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Partial update of an API key.
///
/// `scopes: None` leaves scopes untouched, `Some(vec![])` clears them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApiKeyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// A newly minted key together with its plaintext secret
#[derive(Clone, Serialize)]
pub struct CreatedApiKey {
    #[serde(flatten)]
    pub key: ApiKeyView,
    /// Shown once, never stored
    #[serde(rename = "key")]
    pub secret: String,
}

impl std::fmt::Debug for CreatedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedApiKey")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// What happened to the old key during a rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OldKeyDisposition {
    Revoked,
    ExpiresAt,
    RevocationFailed,
    GracePeriodUpdateFailed,
}

/// Outcome of a rotation
#[derive(Debug, Clone, Serialize)]
pub struct RotationResult {
    pub new_key: CreatedApiKey,
    pub old_key_status: OldKeyDisposition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_expires_at: Option<DateTime<Utc>>,
}

/// API Key service for managing API keys
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository,
{
    repository: Arc<R>,
    organizations: Arc<dyn OrganizationRepository>,
    factory: KeyCredentialFactory,
    clock: Arc<dyn Clock>,
    key_label: String,
}

impl<R: ApiKeyRepository> std::fmt::Debug for ApiKeyService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyService")
            .field("repository", &self.repository)
            .field("key_label", &self.key_label)
            .finish_non_exhaustive()
    }
}

impl<R: ApiKeyRepository> ApiKeyService<R> {
    pub fn new(repository: Arc<R>, organizations: Arc<dyn OrganizationRepository>) -> Self {
        Self {
            repository,
            organizations,
            factory: KeyCredentialFactory::default(),
            clock: Arc::new(SystemClock),
            key_label: DEFAULT_KEY_LABEL.to_string(),
        }
    }

    pub fn with_factory(mut self, factory: KeyCredentialFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_label(mut self, label: impl Into<String>) -> Self {
        self.key_label = label.into();
        self
    }

    /// Create a key owned by `caller`
    pub async fn create(
        &self,
        caller: &Caller,
        request: CreateApiKeyRequest,
    ) -> Result<CreatedApiKey, DomainError> {
        validate_api_key_name(&request.name)?;
        scope::validate_all(&request.scopes)?;

        let organization_id = self
            .resolve_organization(request.organization_id.as_deref())
            .await?;
        self.authorize_scopes(&organization_id, &caller.user_id, &request.scopes)
            .await?;
        let expires_at = parse_expiry(request.expires_at.as_deref())?;

        let generated = self.factory.generate(&self.key_label)?;

        let api_key = ApiKey::new(
            ApiKeyId::generate(),
            organization_id,
            request.name,
            generated.hash,
            generated.display_prefix,
            self.clock.now(),
        )
        .with_owner(caller.user_id.clone())
        .with_description(request.description)
        .with_scopes(request.scopes)
        .with_expiration(expires_at);

        let created = self.repository.create(api_key).await?;

        info!(
            key_id = %created.id(),
            organization_id = %created.organization_id(),
            key_prefix = %created.key_prefix(),
            user_id = %caller.user_id,
            "API key created"
        );

        Ok(CreatedApiKey {
            key: ApiKeyView::from(&created),
            secret: generated.secret,
        })
    }

    /// Get a key the caller owns, or any key for an admin
    pub async fn get(&self, caller: &Caller, id: &ApiKeyId) -> Result<ApiKeyView, DomainError> {
        let key = self.fetch_authorized(caller, id).await?;
        Ok(ApiKeyView::from(&key))
    }

    /// Apply a partial update. Nothing is written unless every field is valid.
    pub async fn update(
        &self,
        caller: &Caller,
        id: &ApiKeyId,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKeyView, DomainError> {
        let mut key = self.fetch_authorized(caller, id).await?;

        if let Some(name) = &request.name {
            validate_api_key_name(name)?;
        }

        if let Some(scopes) = &request.scopes {
            scope::validate_all(scopes)?;
            self.authorize_scopes(key.organization_id(), &caller.user_id, scopes)
                .await?;
        }

        let expires_at = parse_expiry(request.expires_at.as_deref())?;

        if let Some(name) = request.name {
            key.set_name(name);
        }
        if let Some(scopes) = request.scopes {
            key.set_scopes(scopes);
        }
        if expires_at.is_some() {
            key.set_expiration(expires_at);
        }

        let updated = self.repository.update(&key).await?;

        info!(key_id = %id, user_id = %caller.user_id, "API key updated");

        Ok(ApiKeyView::from(&updated))
    }

    pub async fn delete(&self, caller: &Caller, id: &ApiKeyId) -> Result<(), DomainError> {
        self.fetch_authorized(caller, id).await?;

        if !self.repository.delete(id).await? {
            return Err(DomainError::not_found(format!("API key '{}' not found", id)));
        }

        info!(key_id = %id, user_id = %caller.user_id, "API key deleted");
        Ok(())
    }

    /// Replace a key with a fresh credential.
    ///
    /// With a zero grace period the old key is deleted; otherwise it expires
    /// `grace_period_hours` from now. Failing to retire the old key is
    /// reported in the result, never as an error, since the new key is
    /// already stored.
    pub async fn rotate(
        &self,
        caller: &Caller,
        id: &ApiKeyId,
        grace_period_hours: i64,
    ) -> Result<RotationResult, DomainError> {
        if !(0..=MAX_GRACE_PERIOD_HOURS).contains(&grace_period_hours) {
            return Err(DomainError::invalid_grace_period(
                grace_period_hours,
                MAX_GRACE_PERIOD_HOURS,
            ));
        }

        let mut old_key = self.fetch_authorized(caller, id).await?;
        let generated = self.factory.generate(&self.key_label)?;
        let now = self.clock.now();

        let mut new_key = ApiKey::new(
            ApiKeyId::generate(),
            old_key.organization_id().clone(),
            format!("{}{}", old_key.name(), ROTATED_NAME_SUFFIX),
            generated.hash,
            generated.display_prefix,
            now,
        )
        .with_description(old_key.description().map(String::from))
        .with_scopes(old_key.scopes().to_vec())
        .with_expiration(old_key.expires_at());

        if let Some(owner) = old_key.owner_user_id() {
            new_key = new_key.with_owner(owner);
        }

        let created = self.repository.create(new_key).await?;

        info!(
            old_key_id = %id,
            new_key_id = %created.id(),
            key_prefix = %created.key_prefix(),
            grace_period_hours,
            "API key rotated"
        );

        let (old_key_status, old_expires_at) = if grace_period_hours == 0 {
            match self.repository.delete(id).await {
                Ok(_) => (OldKeyDisposition::Revoked, None),
                Err(e) => {
                    warn!(key_id = %id, error = %e, "Failed to revoke rotated API key");
                    (OldKeyDisposition::RevocationFailed, None)
                }
            }
        } else {
            let until = now + Duration::hours(grace_period_hours);
            old_key.set_expiration(Some(until));

            match self.repository.update(&old_key).await {
                Ok(_) => (OldKeyDisposition::ExpiresAt, Some(until)),
                Err(e) => {
                    warn!(key_id = %id, error = %e, "Failed to set grace period on rotated API key");
                    (OldKeyDisposition::GracePeriodUpdateFailed, None)
                }
            }
        };

        Ok(RotationResult {
            new_key: CreatedApiKey {
                key: ApiKeyView::from(&created),
                secret: generated.secret,
            },
            old_key_status,
            old_expires_at,
        })
    }

    /// List the keys visible to `caller`, optionally within one organization.
    ///
    /// Holders of `api_keys:manage` or `admin` see every key; everyone else
    /// sees only their own.
    pub async fn list(
        &self,
        caller: &Caller,
        organization_id: Option<&OrganizationId>,
    ) -> Result<Vec<ApiKeyView>, DomainError> {
        let can_manage_all = caller.can_manage_api_keys();

        let keys = match (organization_id, can_manage_all) {
            (Some(org), true) => self.repository.list_by_organization(org).await?,
            (Some(org), false) => {
                self.repository
                    .list_by_user_and_organization(&caller.user_id, org)
                    .await?
            }
            (None, true) => self.repository.list_all().await?,
            (None, false) => self.repository.list_by_user(&caller.user_id).await?,
        };

        Ok(keys.iter().map(ApiKeyView::from).collect())
    }

    /// Resolve a presented secret to its key.
    ///
    /// Unknown, mismatched and expired secrets all yield `None`.
    pub async fn authenticate(&self, secret: &str) -> Result<Option<ApiKey>, DomainError> {
        let Some(prefix) = KeyCredentialFactory::display_prefix_of(secret) else {
            return Ok(None);
        };

        debug!(key_prefix = %prefix, "Authenticating API key");

        let Some(key) = self.repository.get_by_prefix(prefix).await? else {
            return Ok(None);
        };

        if !KeyCredentialFactory::verify(secret, key.secret_hash()) {
            debug!(key_prefix = %prefix, "API key hash verification failed");
            return Ok(None);
        }

        let now = self.clock.now();
        if key.is_expired_at(now) {
            debug!(key_id = %key.id(), "API key has expired");
            return Ok(None);
        }

        if let Err(e) = self.repository.record_usage(key.id(), now).await {
            warn!(key_id = %key.id(), error = %e, "Failed to record API key usage");
        }

        Ok(Some(key))
    }

    /// Keys whose expiry falls in `[now, now + within)`
    pub async fn list_expiring(&self, within: Duration) -> Result<Vec<ApiKeyView>, DomainError> {
        let now = self.clock.now();

        let keys = self.repository.list_expiring_before(now + within).await?;

        Ok(keys
            .iter()
            .filter(|k| k.expires_at().is_some_and(|at| at >= now))
            .map(ApiKeyView::from)
            .collect())
    }

    async fn fetch_authorized(&self, caller: &Caller, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        let key = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;

        if key.is_owned_by(&caller.user_id) || caller.is_admin() {
            Ok(key)
        } else {
            warn!(key_id = %id, user_id = %caller.user_id, "API key access denied");
            Err(DomainError::access_denied("API key belongs to another user"))
        }
    }

    async fn resolve_organization(
        &self,
        requested: Option<&str>,
    ) -> Result<OrganizationId, DomainError> {
        match requested {
            None | Some("") | Some(DEFAULT_ORGANIZATION_ALIAS) => self
                .organizations
                .get_default_organization()
                .await?
                .map(|org| org.id().clone())
                .ok_or_else(|| {
                    DomainError::default_org_unavailable("No default organization is configured")
                }),
            Some(id) => Ok(OrganizationId::new(id)),
        }
    }

    /// Check that `requested` stays within the caller's role template in
    /// `organization_id`
    async fn authorize_scopes(
        &self,
        organization_id: &OrganizationId,
        user_id: &str,
        requested: &[String],
    ) -> Result<(), DomainError> {
        let member = self
            .organizations
            .get_member_with_role(organization_id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_a_member(organization_id.as_str()))?;

        let template = member
            .role_template
            .ok_or_else(|| DomainError::no_role_assigned(organization_id.as_str()))?;

        if let ScopeDecision::Denied { violating_scope } = scope::authorize(&template.scopes, requested)
        {
            warn!(
                user_id = %user_id,
                organization_id = %organization_id,
                scope = %violating_scope,
                role_template = %template.name,
                "Requested scope exceeds role"
            );
            return Err(DomainError::scope_exceeds_role(
                violating_scope,
                template.scopes,
                template.name,
            ));
        }

        Ok(())
    }
}

fn parse_expiry(value: Option<&str>) -> Result<Option<DateTime<Utc>>, DomainError> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| DomainError::invalid_expiry(v))
        })
        .transpose()
}
