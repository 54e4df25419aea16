//! Update Profile Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::validation;
use crate::auth::PasswordService;
use crate::store::Replicator;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::{User, UserRepository};

/// Command for changing the caller's profile. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl UpdateProfileCommand {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.username.is_none() && self.password.is_none()
    }
}

pub struct UpdateProfileUseCase {
    unit_of_work: Arc<dyn UnitOfWork>,
    user_repo: Arc<dyn UserRepository>,
    password_service: Arc<PasswordService>,
    replicator: Replicator,
}

impl UpdateProfileUseCase {
    pub fn new(
        unit_of_work: Arc<dyn UnitOfWork>,
        user_repo: Arc<dyn UserRepository>,
        password_service: Arc<PasswordService>,
        replicator: Replicator,
    ) -> Self {
        Self {
            unit_of_work,
            user_repo,
            password_service,
            replicator,
        }
    }

    pub async fn execute(&self, command: UpdateProfileCommand, ctx: &ExecutionContext) -> UseCaseResult<User> {
        let principal = ctx.require_principal()?;

        if command.is_empty() {
            return Err(UseCaseError::validation(
                "NO_CHANGES",
                "At least one of name, username or password is required",
            ));
        }

        let name = command.name.as_deref().map(validation::name).transpose()?;
        if let Some(username) = &command.username {
            validation::username(username)?;
        }
        if let Some(password) = &command.password {
            self.password_service
                .validate_password(password)
                .map_err(validation::password_rejected)?;
        }

        let (tx, tx_ctx) = self
            .unit_of_work
            .begin(ctx)
            .await
            .map_err(UseCaseError::from_begin)?;

        let mut user = self
            .user_repo
            .find_by_id(&tx_ctx, principal.user_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("USER_NOT_FOUND", "User not found"))?;

        if let Some(username) = command.username.filter(|u| *u != user.username) {
            // Business rule: username must be unique
            if let Some(owner) = self.user_repo.find_by_username(&tx_ctx, &username).await? {
                if owner.id != user.id {
                    return Err(validation::username_taken(&username));
                }
            }
            user.username = username;
        }

        if let Some(name) = name {
            user.name = name.to_string();
        }

        if let Some(password) = &command.password {
            user.password_hash = self.password_service.hash_password(password)?;
        }

        user.touch();

        let updated = self
            .user_repo
            .update(&tx_ctx, &user)
            .await
            .map_err(validation::classify_write)?;
        if !updated {
            return Err(UseCaseError::not_found("USER_NOT_FOUND", "User not found"));
        }

        tx.commit().await.map_err(UseCaseError::from_commit)?;
        info!(user_id = %user.id, "Profile updated");

        self.replicator.replicate_user(&user);

        Ok(user)
    }
}
