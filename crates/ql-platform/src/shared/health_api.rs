//! Liveness endpoints

use axum::Json;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::shared::api_common::{MessageResponse, StatusResponse};

#[utoipa::path(
    get,
    path = "/ping",
    tag = "health",
    responses((status = 200, description = "Server is up", body = MessageResponse))
)]
pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "pong".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/internal/healthz",
    tag = "health",
    responses((status = 200, description = "Server is healthy", body = StatusResponse))
)]
pub async fn healthz() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

pub fn health_router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(ping))
        .routes(routes!(healthz))
}
