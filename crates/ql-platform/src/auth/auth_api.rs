//! Login endpoint

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::shared::error::PlatformError;
use crate::shared::middleware::{ApiJson, RequestContext};
use crate::user::api::UserResponse;
use crate::user::operations::{LoginCommand, LoginUseCase};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Clone)]
pub struct AuthApiState {
    pub login_use_case: Arc<LoginUseCase>,
}

/// Exchange username and password for an access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthApiState>,
    RequestContext(ctx): RequestContext,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, PlatformError> {
    let command = LoginCommand {
        username: req.username,
        password: req.password,
    };

    let result = state.login_use_case.execute(command, &ctx).await?;
    Ok(Json(LoginResponse {
        token: result.token,
        user: result.user.into(),
    }))
}

pub fn auth_router(state: AuthApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .with_state(state)
}
