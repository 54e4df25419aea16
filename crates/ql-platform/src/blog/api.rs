//! Blogs API

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::blog::operations::{CreateBlogCommand, CreateBlogUseCase, ListBlogsUseCase};
use crate::shared::api_common::DataResponse;
use crate::shared::error::PlatformError;
use crate::shared::middleware::{ApiJson, Authenticated};
use crate::Blog;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBlogRequest {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogResponse {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub username: String,
    /// Creation time, unix seconds
    pub ts: i64,
}

impl From<Blog> for BlogResponse {
    fn from(b: Blog) -> Self {
        Self {
            id: b.id,
            content: b.content,
            author_id: b.author_id,
            username: b.username,
            ts: b.created_at.timestamp(),
        }
    }
}

#[derive(Clone)]
pub struct BlogsState {
    pub create_use_case: Arc<CreateBlogUseCase>,
    pub list_use_case: Arc<ListBlogsUseCase>,
}

/// Publish a blog as the caller
#[utoipa::path(
    post,
    path = "/api/v1/blogs",
    tag = "blogs",
    request_body = CreateBlogRequest,
    responses(
        (status = 201, description = "Blog created", body = DataResponse<BlogResponse>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_blog(
    State(state): State<BlogsState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreateBlogRequest>,
) -> Result<(StatusCode, Json<DataResponse<BlogResponse>>), PlatformError> {
    let command = CreateBlogCommand {
        content: req.content,
    };

    let blog = state.create_use_case.execute(command, &auth).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(blog.into()))))
}

/// List the caller's blogs, newest first
#[utoipa::path(
    get,
    path = "/api/v1/blogs",
    tag = "blogs",
    responses(
        (status = 200, description = "Caller's blogs", body = DataResponse<Vec<BlogResponse>>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_blogs(
    State(state): State<BlogsState>,
    auth: Authenticated,
) -> Result<Json<DataResponse<Vec<BlogResponse>>>, PlatformError> {
    let blogs = state.list_use_case.execute(&auth).await?;
    Ok(Json(DataResponse::new(
        blogs.into_iter().map(BlogResponse::from).collect(),
    )))
}

pub fn blogs_router(state: BlogsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_blog, list_blogs))
        .with_state(state)
}
