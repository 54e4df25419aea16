//! Users API
//!
//! Registration (public and internal) and the caller's own profile.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::shared::api_common::DataResponse;
use crate::shared::error::PlatformError;
use crate::shared::middleware::{ApiJson, Authenticated, RequestContext};
use crate::user::operations::{
    GetProfileUseCase, RegisterUserCommand, RegisterUserUseCase, RegisteredUser,
    UpdateProfileCommand, UpdateProfileUseCase,
};
use crate::User;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// Any subset of the fields; at least one is required.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// A new user with its first access token.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredUserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub token: String,
}

impl From<RegisteredUser> for RegisteredUserResponse {
    fn from(r: RegisteredUser) -> Self {
        Self {
            id: r.user.id,
            name: r.user.name,
            username: r.user.username,
            created_at: r.user.created_at,
            updated_at: r.user.updated_at,
            token: r.token,
        }
    }
}

#[derive(Clone)]
pub struct UsersState {
    pub register_use_case: Arc<RegisterUserUseCase>,
    pub get_profile_use_case: Arc<GetProfileUseCase>,
    pub update_profile_use_case: Arc<UpdateProfileUseCase>,
}

type Created<T> = (StatusCode, Json<DataResponse<T>>);

async fn register(
    state: &UsersState,
    RequestContext(ctx): RequestContext,
    req: RegisterUserRequest,
) -> Result<Created<RegisteredUserResponse>, PlatformError> {
    let command = RegisterUserCommand {
        name: req.name,
        username: req.username,
        password: req.password,
    };

    let registered = state.register_use_case.execute(command, &ctx).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(registered.into()))))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = DataResponse<RegisteredUserResponse>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn register_user(
    State(state): State<UsersState>,
    ctx: RequestContext,
    ApiJson(req): ApiJson<RegisterUserRequest>,
) -> Result<Created<RegisteredUserResponse>, PlatformError> {
    register(&state, ctx, req).await
}

/// Register a new user (service-to-service)
#[utoipa::path(
    post,
    path = "/internal/users",
    tag = "internal",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = DataResponse<RegisteredUserResponse>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn register_user_internal(
    State(state): State<UsersState>,
    ctx: RequestContext,
    ApiJson(req): ApiJson<RegisterUserRequest>,
) -> Result<Created<RegisteredUserResponse>, PlatformError> {
    register(&state, ctx, req).await
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    State(state): State<UsersState>,
    auth: Authenticated,
) -> Result<Json<UserResponse>, PlatformError> {
    let user = state.get_profile_use_case.execute(&auth).await?;
    Ok(Json(user.into()))
}

/// Update the caller's profile
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing or invalid token"),
        (status = 409, description = "Username taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    State(state): State<UsersState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, PlatformError> {
    let command = UpdateProfileCommand {
        name: req.name,
        username: req.username,
        password: req.password,
    };

    let user = state.update_profile_use_case.execute(command, &auth).await?;
    Ok(Json(user.into()))
}

pub fn users_router(state: UsersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(register_user))
        .routes(routes!(register_user_internal))
        .routes(routes!(get_me, update_me))
        .with_state(state)
}
