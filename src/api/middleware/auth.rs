//! Caller authentication
//!
//! A request authenticates with either a session JWT or a registry API key:
//! - Authorization header: `Bearer <jwt or api key>`
//! - X-API-Key header: `<api key>`

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::{debug, error};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::Caller;
use crate::infrastructure::api_key::KeyCredentialFactory;

/// Extractor that requires an authenticated caller
#[derive(Debug, Clone)]
pub struct RequireCaller(pub Caller);

/// Extractor that requires a caller holding `admin`
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Caller);

#[derive(Debug, PartialEq, Eq)]
enum Credential {
    Jwt(String),
    ApiKey(String),
}

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = match extract_credential(&parts.headers)? {
            Credential::Jwt(token) => {
                debug!("Validating JWT token");

                state
                    .jwt_service
                    .validate(&token)
                    .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?
                    .into_caller()
            }
            Credential::ApiKey(secret) => {
                debug!(
                    key_prefix = KeyCredentialFactory::display_prefix_of(&secret).unwrap_or(""),
                    "Validating API key"
                );

                state
                    .api_key_service
                    .authenticate(&secret)
                    .await
                    .map_err(|e| {
                        error!(error = %e, "API key lookup failed");
                        ApiError::internal("An internal error occurred")
                    })?
                    .ok_or_else(|| ApiError::unauthorized("Invalid or expired API key"))?
            }
        };

        Ok(RequireCaller(caller))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireCaller(caller) = RequireCaller::from_request_parts(parts, state).await?;

        if !caller.is_admin() {
            return Err(ApiError::forbidden("Admin scope required"));
        }

        Ok(RequireAdmin(caller))
    }
}

/// Session tokens are JWTs (dot-separated); registry keys never contain a dot
fn extract_credential(headers: &HeaderMap) -> Result<Credential, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim().to_string();
            return Ok(if token.contains('.') {
                Credential::Jwt(token)
            } else {
                Credential::ApiKey(token)
            });
        }
    }

    if let Some(api_key_header) = headers.get("x-api-key") {
        let key = api_key_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-API-Key header encoding"))?;

        return Ok(Credential::ApiKey(key.trim().to_string()));
    }

    Err(ApiError::unauthorized(
        "Authentication required. Provide 'Authorization: Bearer <token>' or 'X-API-Key: <key>' header",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_bearer_jwt() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer aaa.bbb.ccc".parse().unwrap());

        assert_eq!(
            extract_credential(&headers).unwrap(),
            Credential::Jwt("aaa.bbb.ccc".to_string())
        );
    }

    #[test]
    fn test_bearer_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer tfr_abc-DEF_123".parse().unwrap());

        assert_eq!(
            extract_credential(&headers).unwrap(),
            Credential::ApiKey("tfr_abc-DEF_123".to_string())
        );
    }

    #[test]
    fn test_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "tfr_secret".parse().unwrap());

        assert_eq!(
            extract_credential(&headers).unwrap(),
            Credential::ApiKey("tfr_secret".to_string())
        );
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer tfr_bearer".parse().unwrap());
        headers.insert("x-api-key", "tfr_header".parse().unwrap());

        assert_eq!(
            extract_credential(&headers).unwrap(),
            Credential::ApiKey("tfr_bearer".to_string())
        );
    }

    #[test]
    fn test_missing_credentials() {
        let err = extract_credential(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_basic_auth_not_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

        assert!(extract_credential(&headers).is_err());
    }
}
