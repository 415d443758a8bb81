//! Admin API endpoints

pub mod group_mapping;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/oidc/group-mapping",
            get(group_mapping::get_group_mapping)
                .put(group_mapping::put_group_mapping)
                .delete(group_mapping::delete_group_mapping),
        )
        .route(
            "/oidc/group-mapping/preview",
            post(group_mapping::preview_group_mapping),
        )
}
