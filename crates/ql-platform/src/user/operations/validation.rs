//! Input rules shared by the user operations

use crate::details;
use crate::shared::error::PlatformError;
use crate::store::StoreError;
use crate::usecase::{UseCaseError, UseCaseResult};

pub const NAME_MAX_CHARS: usize = 100;
pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;

/// Trimmed display name, 1 to 100 characters.
pub fn name(raw: &str) -> UseCaseResult<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(UseCaseError::validation("NAME_REQUIRED", "Name is required"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(UseCaseError::validation_with_details(
            "NAME_TOO_LONG",
            format!("Name must be at most {} characters", NAME_MAX_CHARS),
            details! { "max" => NAME_MAX_CHARS },
        ));
    }
    Ok(name)
}

/// 3 to 50 characters of ASCII letters, digits, `_`, `.` and `-`.
pub fn username(username: &str) -> UseCaseResult<()> {
    if username.is_empty() {
        return Err(UseCaseError::validation("USERNAME_REQUIRED", "Username is required"));
    }

    let length = username.chars().count();
    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&length) || !allowed {
        return Err(UseCaseError::validation_with_details(
            "USERNAME_INVALID",
            format!(
                "Username must be {}-{} characters of letters, digits, '_', '.' or '-'",
                USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
            ),
            details! { "username" => username },
        ));
    }
    Ok(())
}

/// Policy failure from the password service.
pub fn password_rejected(err: PlatformError) -> UseCaseError {
    match err {
        PlatformError::Validation { message, .. } => {
            UseCaseError::validation("PASSWORD_INVALID", message)
        }
        other => UseCaseError::internal("PASSWORD_CHECK_FAILED", other.to_string()),
    }
}

pub fn username_taken(username: &str) -> UseCaseError {
    UseCaseError::conflict_with_details(
        "USERNAME_EXISTS",
        "Username is already taken",
        details! { "username" => username },
    )
}

/// A unique-key race lost at insert time reads the same as the pre-check.
pub fn classify_write(err: StoreError) -> UseCaseError {
    match err {
        StoreError::Conflict { field: "username", value, .. } => username_taken(&value),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_rules() {
        assert_eq!(name("  Alice  ").unwrap(), "Alice");
        assert_eq!(name("   ").unwrap_err().code(), "NAME_REQUIRED");
        assert_eq!(name(&"n".repeat(101)).unwrap_err().code(), "NAME_TOO_LONG");
        assert!(name(&"n".repeat(100)).is_ok());
    }

    #[test]
    fn test_username_rules() {
        assert!(username("alice_01").is_ok());
        assert!(username("a.b-c").is_ok());
        assert_eq!(username("").unwrap_err().code(), "USERNAME_REQUIRED");
        assert_eq!(username("ab").unwrap_err().code(), "USERNAME_INVALID");
        assert_eq!(username("has space").unwrap_err().code(), "USERNAME_INVALID");
        assert_eq!(username("ünïcode").unwrap_err().code(), "USERNAME_INVALID");
        assert!(username(&"u".repeat(50)).is_ok());
        assert!(username(&"u".repeat(51)).is_err());
    }

    #[test]
    fn test_store_conflict_becomes_username_exists() {
        let err = classify_write(StoreError::duplicate_username("alice"));
        assert_eq!(err.code(), "USERNAME_EXISTS");
        assert_eq!(err.http_status_code(), 409);
    }
}
