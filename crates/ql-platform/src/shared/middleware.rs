//! API Middleware
//!
//! Request context extractors for Axum. `Authenticated` validates the
//! Bearer token through [`VerifyTokenUseCase`] and yields an authenticated
//! [`ExecutionContext`]; `RequestContext` yields an anonymous one.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{FromRequest, FromRequestParts, Request as AxumRequest};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::Request;
use axum::Json;
use serde::de::DeserializeOwned;
use tower::{Layer, Service};

use crate::auth::extract_bearer_token;
use crate::shared::error::PlatformError;
use crate::user::operations::VerifyTokenUseCase;
use crate::usecase::ExecutionContext;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Services the extractors need, injected by [`AuthLayer`].
#[derive(Clone)]
pub struct AppState {
    pub verify_token: Arc<VerifyTokenUseCase>,
}

/// Fresh context, correlated with the caller's `X-Correlation-ID` when sent.
fn request_context(parts: &Parts) -> ExecutionContext {
    parts
        .headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ExecutionContext::with_correlation)
        .unwrap_or_else(ExecutionContext::create)
}

/// Anonymous request context.
pub struct RequestContext(pub ExecutionContext);

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext(request_context(parts)))
    }
}

/// JSON body whose rejections render as a 400 [`PlatformError`].
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request(req: AxumRequest, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Context of a request carrying a valid Bearer token.
pub struct Authenticated(pub ExecutionContext);

impl std::ops::Deref for Authenticated {
    type Target = ExecutionContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| PlatformError::internal("Auth service not configured"))?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .map(String::from)
            .ok_or_else(|| PlatformError::unauthorized("Missing bearer token"))?;

        let ctx = request_context(parts);
        let principal = app_state.verify_token.execute(&token, &ctx).await?;

        Ok(Authenticated(ctx.authenticated(principal)))
    }
}

/// Layer that puts [`AppState`] into every request's extensions.
#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<Request<B>> for AuthMiddleware<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());
        self.inner.call(req)
    }
}
