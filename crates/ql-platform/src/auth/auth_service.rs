//! Authentication Service
//!
//! HS256 JWT access tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use ql_config::JwtConfig;

use crate::shared::error::{PlatformError, Result};
use crate::User;

/// JWT Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,

    pub username: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// JWT ID (unique identifier)
    pub jti: String,
}

/// Configuration for the auth service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret
    pub secret_key: String,
    pub issuer: String,
    pub audience: String,
    /// Access token expiration in seconds
    pub access_token_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            issuer: "quill".to_string(),
            audience: "quill".to_string(),
            access_token_expiry_secs: 86400,
        }
    }
}

impl From<&JwtConfig> for AuthConfig {
    fn from(jwt: &JwtConfig) -> Self {
        Self {
            secret_key: jwt.secret.clone(),
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            access_token_expiry_secs: i64::try_from(jwt.access_token_expiry_secs).unwrap_or(i64::MAX),
        }
    }
}

pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        info!(issuer = %config.issuer, "AuthService initialized with HS256");

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let exp = Duration::try_seconds(self.config.access_token_expiry_secs)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                PlatformError::internal(format!(
                    "Token lifetime of {}s is out of range",
                    self.config.access_token_expiry_secs
                ))
            })?;

        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::internal(format!("Failed to encode JWT: {}", e)))
    }

    /// Validate an access token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken {
                    message: e.to_string(),
                },
            })
    }

    pub fn access_token_expiry_secs(&self) -> i64 {
        self.config.access_token_expiry_secs
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            secret_key: "test-secret-with-enough-bytes-for-hs256".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = AuthService::new(config());
        let user = User::new("Alice", "alice", "hash");

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iss, "quill");
    }

    #[test]
    fn test_expired_token() {
        let service = AuthService::new(AuthConfig {
            access_token_expiry_secs: -3600,
            ..config()
        });
        let token = service
            .generate_access_token(&User::new("Bob", "bob", "hash"))
            .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(PlatformError::TokenExpired)
        ));
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let service = AuthService::new(AuthConfig::from(&JwtConfig {
            secret: "test-secret-with-enough-bytes-for-hs256".to_string(),
            access_token_expiry_secs: 10_000_000_000_000,
            ..JwtConfig::default()
        }));

        let result = service.generate_access_token(&User::new("Eve", "eve", "hash"));
        assert!(matches!(result, Err(PlatformError::Internal { .. })));
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let issuer = AuthService::new(config());
        let other = AuthService::new(AuthConfig {
            secret_key: "another-secret-entirely-different".to_string(),
            ..AuthConfig::default()
        });
        let token = issuer
            .generate_access_token(&User::new("Carol", "carol", "hash"))
            .unwrap();

        assert!(matches!(
            other.validate_token(&token),
            Err(PlatformError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let issuer = AuthService::new(config());
        let verifier = AuthService::new(AuthConfig {
            audience: "someone-else".to_string(),
            ..config()
        });
        let token = issuer
            .generate_access_token(&User::new("Dan", "dan", "hash"))
            .unwrap();

        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
