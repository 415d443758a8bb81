//! OAuth login endpoints
//!
//! `login` opens a pending login and hands back its state token. The
//! callback consumes that token exactly once, verifies the provider's ID
//! token, applies group role mappings for its subject and issues a session
//! carrying the scopes of every role the user now holds. Exchanging the
//! authorization code happens upstream; the callback receives the raw ID
//! token.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiErrorType, Json};
use crate::domain::ProviderType;
use crate::domain::organization::combined_scopes;
use crate::infrastructure::group_mapping::{groups_from_claims, AppliedAssignment};

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", post(callback))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    ProviderType::Oidc.as_str().to_string()
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub state: String,
    pub provider: ProviderType,
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Json<LoginResponse>, ApiError> {
    let provider: ProviderType = query.provider.parse()?;

    let token = state.oauth_states.begin(provider).await?;

    info!(provider = %provider, "OAuth login started");

    Ok(Json(LoginResponse {
        state: token,
        provider,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub state: String,
    /// ID token from the provider's token response
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub user_id: String,
    pub provider: ProviderType,
    pub groups: Vec<String>,
    pub assignments: Vec<AppliedAssignment>,
    /// Session JWT
    pub token: String,
    pub scopes: Vec<String>,
    pub expires_in: u64,
}

pub async fn callback(
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, ApiError> {
    let verifier = state.id_tokens.as_ref().ok_or_else(|| {
        warn!("OAuth callback rejected: no identity provider configured");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServerError,
            "Login is not configured",
        )
        .with_code("login_not_configured")
    })?;

    let pending = state
        .oauth_states
        .consume(&request.state)
        .await?
        .ok_or_else(|| {
            warn!("OAuth callback with unknown, used or expired state");
            ApiError::bad_request("Invalid or expired state").with_code("invalid_state")
        })?;

    let claims = verifier.verify(&request.id_token).map_err(|e| {
        warn!(provider = %pending.provider_type, error = %e, "ID token rejected");
        ApiError::unauthorized("Invalid ID token").with_code("invalid_id_token")
    })?;

    let user_id = claims
        .get("sub")
        .and_then(Value::as_str)
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| ApiError::bad_request("ID token is missing 'sub'"))?
        .to_string();

    let claim_name = state.group_roles.group_claim_name().await;
    let groups = groups_from_claims(&claims, &claim_name);

    let assignments = state.group_roles.apply(&user_id, &groups).await?;

    let memberships = state.organizations.list_user_memberships(&user_id).await?;
    let scopes = combined_scopes(&memberships);
    let token = state.jwt_service.generate(&user_id, &scopes)?;

    info!(
        user_id = %user_id,
        provider = %pending.provider_type,
        groups = groups.len(),
        assignments = assignments.len(),
        scopes = scopes.len(),
        "OAuth login completed"
    );

    Ok(Json(CallbackResponse {
        user_id,
        provider: pending.provider_type,
        groups,
        assignments,
        token,
        scopes,
        expires_in: state.jwt_service.expiration_hours().saturating_mul(3600),
    }))
}
