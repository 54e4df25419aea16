//! Platform Error Types

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use utoipa::ToSchema;

use crate::usecase::error::Details;
use crate::usecase::UseCaseError;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{message}")]
    Validation {
        code: String,
        message: String,
        details: Details,
    },

    #[error("{message}")]
    Conflict {
        code: String,
        message: String,
        details: Details,
    },

    #[error("{message}")]
    Unauthorized { code: String, message: String },

    #[error("{message}")]
    NotFound { code: String, message: String },

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: "VALIDATION_ERROR".to_string(),
            message: message.into(),
            details: Details::new(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: "UNAUTHORIZED".to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unauthorized { .. } | Self::TokenExpired | Self::InvalidToken { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::StoreUnavailable { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Validation { code, .. }
            | Self::Conflict { code, .. }
            | Self::Unauthorized { code, .. }
            | Self::NotFound { code, .. } => code,
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken { .. } => "INVALID_TOKEN",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Details>,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let details = match &self {
            Self::Validation { details, .. } | Self::Conflict { details, .. } if !details.is_empty() => {
                Some(details.clone())
            }
            _ => None,
        };

        // internal causes stay in the log
        let message = match &self {
            Self::StoreUnavailable { .. } | Self::Internal { .. } => {
                "The request could not be completed".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<UseCaseError> for PlatformError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::ValidationError { code, message, details } => {
                PlatformError::Validation { code, message, details }
            }
            UseCaseError::ConflictError { code, message, details } => {
                PlatformError::Conflict { code, message, details }
            }
            UseCaseError::UnauthorizedError { code, message, .. } => {
                PlatformError::Unauthorized { code, message }
            }
            UseCaseError::NotFoundError { code, message, .. } => {
                PlatformError::NotFound { code, message }
            }
            UseCaseError::StoreUnavailable { message, .. } => {
                PlatformError::StoreUnavailable { message }
            }
            UseCaseError::InternalError { code, message, .. } => PlatformError::Internal {
                message: format!("[{}] {}", code, message),
            },
        }
    }
}

/// Missing, malformed, or mistyped request body.
impl From<JsonRejection> for PlatformError {
    fn from(rejection: JsonRejection) -> Self {
        PlatformError::Validation {
            code: "INVALID_BODY".to_string(),
            message: rejection.body_text(),
            details: Details::new(),
        }
    }
}

/// Service failures (hashing, token handling) surfacing inside a use case.
impl From<PlatformError> for UseCaseError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Validation { code, message, details } => {
                UseCaseError::validation_with_details(code, message, details)
            }
            PlatformError::Conflict { code, message, details } => {
                UseCaseError::conflict_with_details(code, message, details)
            }
            PlatformError::Unauthorized { code, message } => UseCaseError::unauthorized(code, message),
            PlatformError::NotFound { code, message } => UseCaseError::not_found(code, message),
            PlatformError::TokenExpired => {
                UseCaseError::unauthorized("TOKEN_EXPIRED", "Access token has expired")
            }
            PlatformError::InvalidToken { message } => UseCaseError::unauthorized("INVALID_TOKEN", message),
            PlatformError::StoreUnavailable { message } => UseCaseError::store_unavailable(message),
            PlatformError::Internal { message } => UseCaseError::internal("INTERNAL_ERROR", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_case_errors_keep_status() {
        let cases = [
            (UseCaseError::validation("X", "x"), StatusCode::BAD_REQUEST),
            (UseCaseError::conflict("X", "x"), StatusCode::CONFLICT),
            (UseCaseError::unauthorized("X", "x"), StatusCode::UNAUTHORIZED),
            (UseCaseError::not_found("X", "x"), StatusCode::NOT_FOUND),
            (UseCaseError::store_unavailable("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (UseCaseError::commit("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let code = err.http_status_code();
            let platform = PlatformError::from(err);
            assert_eq!(platform.status(), status);
            assert_eq!(platform.status().as_u16(), code);
        }
    }

    #[test]
    fn test_token_errors_become_unauthorized() {
        let expired = UseCaseError::from(PlatformError::TokenExpired);
        assert_eq!(expired.code(), "TOKEN_EXPIRED");
        assert_eq!(expired.http_status_code(), 401);

        let invalid = UseCaseError::from(PlatformError::InvalidToken { message: "bad".into() });
        assert_eq!(invalid.http_status_code(), 401);
    }

    #[test]
    fn test_use_case_code_is_preserved() {
        let err = PlatformError::from(UseCaseError::conflict("USERNAME_EXISTS", "taken"));
        assert_eq!(err.code(), "USERNAME_EXISTS");
    }
}
