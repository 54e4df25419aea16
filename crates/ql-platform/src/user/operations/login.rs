//! Login Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::{AuthService, PasswordService};
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};
use crate::{User, UserRepository};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
}

/// Same error for an unknown username and a wrong password.
fn invalid_credentials() -> UseCaseError {
    UseCaseError::unauthorized("INVALID_CREDENTIALS", "Invalid username or password")
}

pub struct LoginUseCase {
    user_repo: Arc<dyn UserRepository>,
    password_service: Arc<PasswordService>,
    auth_service: Arc<AuthService>,
}

impl LoginUseCase {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        password_service: Arc<PasswordService>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            user_repo,
            password_service,
            auth_service,
        }
    }

    /// Read-only: runs on the default connection, no unit of work.
    pub async fn execute(&self, command: LoginCommand, ctx: &ExecutionContext) -> UseCaseResult<LoginResult> {
        if command.username.trim().is_empty() {
            return Err(UseCaseError::validation("USERNAME_REQUIRED", "Username is required"));
        }
        if command.password.is_empty() {
            return Err(UseCaseError::validation("PASSWORD_REQUIRED", "Password is required"));
        }

        let Some(user) = self.user_repo.find_by_username(ctx, &command.username).await? else {
            // same argon2 work as a wrong password
            self.password_service.verify_decoy(&command.password);
            debug!(correlation_id = %ctx.correlation_id, "Login for unknown username");
            return Err(invalid_credentials());
        };

        if !self
            .password_service
            .verify_password(&command.password, &user.password_hash)?
        {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(invalid_credentials());
        }

        let token = self.auth_service.generate_access_token(&user)?;
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResult { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    fn use_case(f: &Fixture) -> LoginUseCase {
        LoginUseCase::new(f.store.clone(), f.passwords.clone(), f.auth.clone())
    }

    fn command(username: &str, password: &str) -> LoginCommand {
        LoginCommand {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_login_returns_signed_token() {
        let f = Fixture::new();
        let user = f.seed_user("alice", "right-password").await;

        let result = use_case(&f)
            .execute(command("alice", "right-password"), &ExecutionContext::create())
            .await
            .unwrap();

        assert_eq!(result.user.id, user.id);
        let claims = f.auth.validate_token(&result.token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(f.store.stats().begins, 0);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let f = Fixture::new();
        f.seed_user("alice", "right-password").await;
        let uc = use_case(&f);
        let ctx = ExecutionContext::create();

        let wrong_password = uc
            .execute(command("alice", "wrong-password"), &ctx)
            .await
            .unwrap_err();
        let unknown_user = uc
            .execute(command("nobody", "wrong-password"), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, UseCaseError::UnauthorizedError { .. }));
        assert_eq!(wrong_password.code(), unknown_user.code());
        assert_eq!(wrong_password.message(), unknown_user.message());
        assert_eq!(wrong_password.http_status_code(), unknown_user.http_status_code());
    }

    #[tokio::test]
    async fn test_blank_fields_are_validation_errors() {
        let f = Fixture::new();
        let uc = use_case(&f);
        let ctx = ExecutionContext::create();

        assert_eq!(uc.execute(command(" ", "x"), &ctx).await.unwrap_err().code(), "USERNAME_REQUIRED");
        assert_eq!(uc.execute(command("alice", ""), &ctx).await.unwrap_err().code(), "PASSWORD_REQUIRED");
    }
}
