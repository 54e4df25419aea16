//! Register User Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::validation;
use crate::auth::{AuthService, PasswordService};
use crate::store::Replicator;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::{User, UserRepository};

/// Command for registering a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserCommand {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// The stored user plus an access token for it.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: User,
    pub token: String,
}

pub struct RegisterUserUseCase {
    unit_of_work: Arc<dyn UnitOfWork>,
    user_repo: Arc<dyn UserRepository>,
    password_service: Arc<PasswordService>,
    auth_service: Arc<AuthService>,
    replicator: Replicator,
}

impl RegisterUserUseCase {
    pub fn new(
        unit_of_work: Arc<dyn UnitOfWork>,
        user_repo: Arc<dyn UserRepository>,
        password_service: Arc<PasswordService>,
        auth_service: Arc<AuthService>,
        replicator: Replicator,
    ) -> Self {
        Self {
            unit_of_work,
            user_repo,
            password_service,
            auth_service,
            replicator,
        }
    }

    pub async fn execute(
        &self,
        command: RegisterUserCommand,
        ctx: &ExecutionContext,
    ) -> UseCaseResult<RegisteredUser> {
        let name = validation::name(&command.name)?;
        validation::username(&command.username)?;
        self.password_service
            .validate_password(&command.password)
            .map_err(validation::password_rejected)?;

        let (tx, tx_ctx) = self
            .unit_of_work
            .begin(ctx)
            .await
            .map_err(UseCaseError::from_begin)?;

        // Business rule: username must be unique
        if self
            .user_repo
            .find_by_username(&tx_ctx, &command.username)
            .await?
            .is_some()
        {
            return Err(validation::username_taken(&command.username));
        }

        let password_hash = self.password_service.hash_password(&command.password)?;
        let user = User::new(name, &command.username, password_hash);

        self.user_repo
            .create(&tx_ctx, &user)
            .await
            .map_err(validation::classify_write)?;

        let token = self.auth_service.generate_access_token(&user)?;

        tx.commit().await.map_err(UseCaseError::from_commit)?;

        info!(
            user_id = %user.id,
            username = %user.username,
            correlation_id = %ctx.correlation_id,
            "User registered"
        );

        // non-critical; outcome is logged and counted by the replicator
        self.replicator.replicate_user(&user);

        Ok(RegisteredUser { user, token })
    }
}
