//! API key endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::debug;

use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::api_key::ApiKeyView;
use crate::infrastructure::api_key::{
    CreateApiKeyRequest, CreatedApiKey, RotationResult, UpdateApiKeyRequest,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListApiKeysQuery {
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RotateApiKeyRequest {
    /// Hours the old key stays valid; 0 revokes it at once
    #[serde(default)]
    pub grace_period_hours: i64,
}

pub async fn list_api_keys(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Query(query): Query<ListApiKeysQuery>,
) -> Result<Json<Vec<ApiKeyView>>, ApiError> {
    debug!(user_id = %caller.user_id, "Listing API keys");

    let keys = state
        .api_key_service
        .list(&caller, query.organization_id.as_deref())
        .await?;

    Ok(Json(keys))
}

pub async fn create_api_key(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<CreatedApiKey>), ApiError> {
    let created = state.api_key_service.create(&caller, request).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_api_key(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<String>,
) -> Result<Json<ApiKeyView>, ApiError> {
    let key = state.api_key_service.get(&caller, &id).await?;

    Ok(Json(key))
}

pub async fn update_api_key(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<String>,
    Json(request): Json<UpdateApiKeyRequest>,
) -> Result<Json<ApiKeyView>, ApiError> {
    let key = state.api_key_service.update(&caller, &id, request).await?;

    Ok(Json(key))
}

pub async fn delete_api_key(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.api_key_service.delete(&caller, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn rotate_api_key(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(id): Path<String>,
    Json(request): Json<RotateApiKeyRequest>,
) -> Result<Json<RotationResult>, ApiError> {
    let result = state
        .api_key_service
        .rotate(&caller, &id, request.grace_period_hours)
        .await?;

    Ok(Json(result))
}
