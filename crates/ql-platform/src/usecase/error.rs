//! Use Case Errors
//!
//! Categorized error types for use case failures. Each category maps to one
//! HTTP status code so handlers never inspect messages.
//!
//! ```ignore
//! use ql_platform::usecase::UseCaseError;
//! use ql_platform::details;
//!
//! UseCaseError::validation("USERNAME_REQUIRED", "Username is required");
//!
//! UseCaseError::conflict_with_details(
//!     "USERNAME_EXISTS",
//!     "Username is already taken",
//!     details! { "username" => username },
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;

use crate::store::StoreError;

/// Macro for creating error detail maps.
///
/// ```ignore
/// let details = details! { "username" => "alice", "max" => 50 };
/// ```
#[macro_export]
macro_rules! details {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), serde_json::json!($value));
        )+
        map
    }};
}

pub type Details = HashMap<String, serde_json::Value>;

/// Categorized error types for use case failures.
///
/// - `ValidationError` -> 400 Bad Request
/// - `UnauthorizedError` -> 401 Unauthorized
/// - `NotFoundError` -> 404 Not Found
/// - `ConflictError` -> 409 Conflict
/// - `StoreUnavailable` -> 500 Internal Server Error
/// - `InternalError` -> 500 Internal Server Error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UseCaseError {
    /// Malformed or missing input.
    ValidationError {
        code: String,
        message: String,
        #[serde(default)]
        details: Details,
    },

    /// A unique key is already taken.
    ConflictError {
        code: String,
        message: String,
        #[serde(default)]
        details: Details,
    },

    /// Bad credentials, or a missing, invalid, or expired token.
    UnauthorizedError {
        code: String,
        message: String,
        #[serde(default)]
        details: Details,
    },

    NotFoundError {
        code: String,
        message: String,
        #[serde(default)]
        details: Details,
    },

    /// The store could not open a transaction.
    StoreUnavailable {
        code: String,
        message: String,
        #[serde(default)]
        details: Details,
    },

    /// Store fault, failed commit, or any other unexpected failure.
    InternalError {
        code: String,
        message: String,
        #[serde(default)]
        details: Details,
    },
}

impl UseCaseError {
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation_with_details(code, message, HashMap::new())
    }

    pub fn validation_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Details,
    ) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::conflict_with_details(code, message, HashMap::new())
    }

    pub fn conflict_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Details,
    ) -> Self {
        Self::ConflictError {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnauthorizedError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFoundError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            code: "STORE_UNAVAILABLE".to_string(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InternalError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// A commit failed. The outcome of the writes is unknown to the caller.
    pub fn commit(message: impl Into<String>) -> Self {
        Self::internal("COMMIT_FAILED", message)
    }

    /// Classify a failure to begin a unit of work.
    pub fn from_begin(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => Self::store_unavailable(message),
            other => {
                error!(error = %other, "Failed to begin unit of work");
                Self::internal("BEGIN_FAILED", other.to_string())
            }
        }
    }

    /// Classify a failed commit; always internal.
    pub fn from_commit(err: StoreError) -> Self {
        error!(error = %err, "Transaction commit failed");
        Self::commit(err.to_string())
    }

    pub fn code(&self) -> &str {
        match self {
            Self::ValidationError { code, .. }
            | Self::ConflictError { code, .. }
            | Self::UnauthorizedError { code, .. }
            | Self::NotFoundError { code, .. }
            | Self::StoreUnavailable { code, .. }
            | Self::InternalError { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ValidationError { message, .. }
            | Self::ConflictError { message, .. }
            | Self::UnauthorizedError { message, .. }
            | Self::NotFoundError { message, .. }
            | Self::StoreUnavailable { message, .. }
            | Self::InternalError { message, .. } => message,
        }
    }

    pub fn details(&self) -> &Details {
        match self {
            Self::ValidationError { details, .. }
            | Self::ConflictError { details, .. }
            | Self::UnauthorizedError { details, .. }
            | Self::NotFoundError { details, .. }
            | Self::StoreUnavailable { details, .. }
            | Self::InternalError { details, .. } => details,
        }
    }

    /// Get the suggested HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ValidationError { .. } => 400,
            Self::UnauthorizedError { .. } => 401,
            Self::NotFoundError { .. } => 404,
            Self::ConflictError { .. } => 409,
            Self::StoreUnavailable { .. } | Self::InternalError { .. } => 500,
        }
    }
}

/// Default classification of repository failures.
impl From<StoreError> for UseCaseError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => Self::store_unavailable(message),
            StoreError::Conflict { entity, field, value } => Self::conflict_with_details(
                format!("{}_{}_EXISTS", entity, field).to_uppercase(),
                format!("A {} with this {} already exists", entity, field),
                details! { "field" => field, "value" => value },
            ),
            other => {
                error!(error = %other, "Store operation failed");
                Self::internal("STORE_ERROR", other.to_string())
            }
        }
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for UseCaseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(UseCaseError::validation("X", "x").http_status_code(), 400);
        assert_eq!(UseCaseError::unauthorized("X", "x").http_status_code(), 401);
        assert_eq!(UseCaseError::not_found("X", "x").http_status_code(), 404);
        assert_eq!(UseCaseError::conflict("X", "x").http_status_code(), 409);
        assert_eq!(UseCaseError::store_unavailable("x").http_status_code(), 500);
        assert_eq!(UseCaseError::commit("x").http_status_code(), 500);
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: UseCaseError = StoreError::Conflict {
            entity: "user",
            field: "username",
            value: "alice".into(),
        }
        .into();

        assert!(matches!(err, UseCaseError::ConflictError { .. }));
        assert_eq!(err.code(), "USER_USERNAME_EXISTS");
        assert_eq!(err.details().get("value"), Some(&serde_json::json!("alice")));
    }

    #[test]
    fn test_store_unavailable_maps_to_store_unavailable() {
        let err: UseCaseError = StoreError::Unavailable("pool exhausted".into()).into();
        assert!(matches!(err, UseCaseError::StoreUnavailable { .. }));
    }

    #[test]
    fn test_closed_transaction_is_internal() {
        let err: UseCaseError = StoreError::TransactionClosed.into();
        assert!(matches!(err, UseCaseError::InternalError { .. }));
        assert_eq!(err.code(), "STORE_ERROR");
    }

    #[test]
    fn test_commit_failure_is_internal() {
        let err = UseCaseError::from_commit(StoreError::Unavailable("connection reset".into()));
        assert_eq!(err.code(), "COMMIT_FAILED");
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_details_macro() {
        let empty: Details = details!();
        assert!(empty.is_empty());

        let d = details! { "username" => "bob", "max" => 50 };
        assert_eq!(d.get("username"), Some(&serde_json::json!("bob")));
        assert_eq!(d.get("max"), Some(&serde_json::json!(50)));
    }

    #[test]
    fn test_display() {
        let err = UseCaseError::validation("CONTENT_REQUIRED", "Content is required");
        assert_eq!(err.to_string(), "[CONTENT_REQUIRED] Content is required");
    }
}
