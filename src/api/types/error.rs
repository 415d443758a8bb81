//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::{DomainError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    PermissionError,
    NotFoundError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::PermissionError => write!(f, "permission_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Scopes the caller's role grants, on scope escalation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_template: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: None,
                    allowed_scopes: None,
                    role_template: None,
                },
            },
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiErrorType::AuthenticationError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiErrorType::PermissionError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

fn error_code(err: &DomainError) -> &'static str {
    match err {
        DomainError::NotFound { .. } => "not_found",
        DomainError::Validation { .. } => "validation_failed",
        DomainError::InvalidId { .. } => "invalid_id",
        DomainError::InvalidScope { .. } => "invalid_scope",
        DomainError::InvalidExpiry { .. } => "invalid_expiry",
        DomainError::InvalidGracePeriod { .. } => "invalid_grace_period",
        DomainError::NotAMember { .. } => "not_a_member",
        DomainError::NoRoleAssigned { .. } => "no_role_assigned",
        DomainError::ScopeExceedsRole { .. } => "scope_exceeds_role",
        DomainError::AccessDenied { .. } => "access_denied",
        DomainError::Conflict { .. } => "conflict",
        DomainError::DefaultOrgUnavailable { .. }
        | DomainError::CredentialGeneration { .. }
        | DomainError::Configuration { .. }
        | DomainError::Internal { .. }
        | DomainError::Storage { .. } => "internal_error",
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let code = error_code(&err);

        let api_error = match err.kind() {
            ErrorKind::Client => Self::bad_request(err.to_string()),
            ErrorKind::Authorization => Self::forbidden(err.to_string()),
            ErrorKind::NotFound => Self::not_found(err.to_string()),
            ErrorKind::Server => {
                error!(error = %err, "Request failed with server error");
                Self::internal("An internal error occurred")
            }
        }
        .with_code(code);

        match err {
            DomainError::ScopeExceedsRole {
                allowed_scopes,
                role_template,
                ..
            } => {
                let mut api_error = api_error;
                api_error.response.error.allowed_scopes = Some(allowed_scopes);
                api_error.response.error.role_template = Some(role_template);
                api_error
            }
            _ => api_error,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}
