//! Get Profile Use Case

use std::sync::Arc;

use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};
use crate::{User, UserRepository};

pub struct GetProfileUseCase {
    user_repo: Arc<dyn UserRepository>,
}

impl GetProfileUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// The caller's own user record.
    pub async fn execute(&self, ctx: &ExecutionContext) -> UseCaseResult<User> {
        let principal = ctx.require_principal()?;

        self.user_repo
            .find_by_id(ctx, principal.user_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("USER_NOT_FOUND", "User not found"))
    }
}
