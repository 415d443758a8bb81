//! Infrastructure layer - storage backends, credential material and services

pub mod api_key;
pub mod auth;
pub mod group_mapping;
pub mod logging;
pub mod oauth;
pub mod organization;
pub mod random;
