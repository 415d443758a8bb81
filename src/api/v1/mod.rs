//! v1 API endpoints

pub mod api_keys;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/apikeys",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route(
            "/apikeys/{id}",
            get(api_keys::get_api_key)
                .put(api_keys::update_api_key)
                .delete(api_keys::delete_api_key),
        )
        .route("/apikeys/{id}/rotate", post(api_keys::rotate_api_key))
}
