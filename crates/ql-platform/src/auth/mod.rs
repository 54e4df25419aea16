//! Authentication primitives and the login endpoint

pub mod auth_api;
pub mod auth_service;
pub mod password_service;

pub use auth_service::{extract_bearer_token, AccessTokenClaims, AuthConfig, AuthService};
pub use password_service::{Argon2Config, PasswordPolicy, PasswordService};
