//! Group mapping administration
//!
//! Edits the stored configuration. When it holds any value it replaces the
//! static configuration as a whole.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::group_mapping::{GroupMappingConfig, GroupMappingSource};
use crate::infrastructure::group_mapping::Resolution;

#[derive(Debug, Serialize)]
pub struct GroupMappingResponse {
    /// Stored configuration, if any
    pub stored: Option<GroupMappingConfig>,
    /// Configuration the resolver currently uses
    pub effective: GroupMappingConfig,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub groups: Vec<String>,
}

async fn current(state: &AppState) -> Result<GroupMappingResponse, ApiError> {
    Ok(GroupMappingResponse {
        stored: state.group_mappings.active().await?,
        effective: state.group_roles.effective_config().await,
    })
}

pub async fn get_group_mapping(
    State(state): State<AppState>,
    RequireAdmin(_caller): RequireAdmin,
) -> Result<Json<GroupMappingResponse>, ApiError> {
    Ok(Json(current(&state).await?))
}

pub async fn put_group_mapping(
    State(state): State<AppState>,
    RequireAdmin(caller): RequireAdmin,
    Json(config): Json<GroupMappingConfig>,
) -> Result<Json<GroupMappingResponse>, ApiError> {
    config.validate()?;

    state.group_mappings.replace(config).await;
    info!(user_id = %caller.user_id, "Stored group mapping configuration updated");

    Ok(Json(current(&state).await?))
}

pub async fn delete_group_mapping(
    State(state): State<AppState>,
    RequireAdmin(caller): RequireAdmin,
) -> Result<StatusCode, ApiError> {
    state.group_mappings.clear().await;
    info!(user_id = %caller.user_id, "Stored group mapping configuration cleared");

    Ok(StatusCode::NO_CONTENT)
}

/// Resolve groups against the effective configuration without writing
pub async fn preview_group_mapping(
    State(state): State<AppState>,
    RequireAdmin(_caller): RequireAdmin,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<Resolution>, ApiError> {
    let resolution = state.group_roles.resolve(&request.groups).await?;

    Ok(Json(resolution))
}
