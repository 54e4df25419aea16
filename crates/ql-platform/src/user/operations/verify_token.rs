//! Verify Token Use Case
//!
//! Turns a bearer token into the [`Principal`] of a user that still exists.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::AuthService;
use crate::usecase::{ExecutionContext, Principal, UseCaseError, UseCaseResult};
use crate::UserRepository;

pub struct VerifyTokenUseCase {
    user_repo: Arc<dyn UserRepository>,
    auth_service: Arc<AuthService>,
}

impl VerifyTokenUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>, auth_service: Arc<AuthService>) -> Self {
        Self {
            user_repo,
            auth_service,
        }
    }

    pub async fn execute(&self, token: &str, ctx: &ExecutionContext) -> UseCaseResult<Principal> {
        let claims = self.auth_service.validate_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| UseCaseError::unauthorized("INVALID_TOKEN", "Token subject is not a user id"))?;

        let user = self
            .user_repo
            .find_by_id(ctx, user_id)
            .await?
            .ok_or_else(|| UseCaseError::unauthorized("USER_NOT_FOUND", "Token refers to an unknown user"))?;

        Ok(Principal::new(user.id, user.username))
    }
}
