//! Wiring
//!
//! Builds the selected stores, the use cases on top of them, and the HTTP
//! router that exposes them.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use tracing::info;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::OpenApi as OpenApiDoc;
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;

use ql_config::{AppConfig, PrimaryStore};

use crate::auth::auth_api::{auth_router, AuthApiState};
use crate::auth::{AuthConfig, AuthService, PasswordService};
use crate::blog::operations::{CreateBlogUseCase, ListBlogsUseCase};
use crate::blog::{blogs_router, BlogsState};
use crate::shared::health_api::health_router;
use crate::shared::middleware::{AppState, AuthLayer};
use crate::store::{MemoryStore, RelationalStore, Replicator, WideColumnStore};
use crate::user::operations::{
    GetProfileUseCase, LoginUseCase, RegisterUserUseCase, UpdateProfileUseCase,
    VerifyTokenUseCase,
};
use crate::user::{users_router, UsersState};
use crate::{BlogRepository, UnitOfWork, UserRepository};

/// The primary store seen through each of its roles, plus the replicator.
#[derive(Clone)]
pub struct Stores {
    pub unit_of_work: Arc<dyn UnitOfWork>,
    pub users: Arc<dyn UserRepository>,
    pub blogs: Arc<dyn BlogRepository>,
    pub replicator: Replicator,
}

impl Stores {
    /// Use one store for every role, without replication.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UnitOfWork + UserRepository + BlogRepository + 'static,
    {
        Self {
            unit_of_work: store.clone(),
            users: store.clone(),
            blogs: store,
            replicator: Replicator::disabled(),
        }
    }

    pub fn with_replicator(mut self, replicator: Replicator) -> Self {
        self.replicator = replicator;
        self
    }

    /// Connect the configured primary store and, when enabled, the
    /// wide-column replica.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let stores = match config.store.primary {
            PrimaryStore::Relational => {
                let store = RelationalStore::connect(&config.database)
                    .await
                    .context("Failed to connect to relational store")?;
                store
                    .ensure_schema()
                    .await
                    .context("Failed to create relational schema")?;
                Self::from_store(Arc::new(store))
            }
            PrimaryStore::WideColumn => {
                let store = WideColumnStore::connect(&config.wide_column)
                    .await
                    .context("Failed to connect to wide-column store")?;
                Self::from_store(Arc::new(store))
            }
            PrimaryStore::Memory => Self::from_store(Arc::new(MemoryStore::new())),
        };

        let stores = if config.replication_enabled() {
            let replica = WideColumnStore::connect(&config.wide_column)
                .await
                .context("Failed to connect to wide-column replica")?;
            stores.with_replicator(Replicator::new(Arc::new(replica)))
        } else {
            stores
        };

        info!(
            primary = %config.store.primary,
            store = stores.unit_of_work.store_name(),
            replication = stores.replicator.is_enabled(),
            "Stores ready"
        );
        Ok(stores)
    }
}

/// Every use case, built once at startup.
#[derive(Clone)]
pub struct Platform {
    pub register_user: Arc<RegisterUserUseCase>,
    pub login: Arc<LoginUseCase>,
    pub verify_token: Arc<VerifyTokenUseCase>,
    pub get_profile: Arc<GetProfileUseCase>,
    pub update_profile: Arc<UpdateProfileUseCase>,
    pub create_blog: Arc<CreateBlogUseCase>,
    pub list_blogs: Arc<ListBlogsUseCase>,
    pub replicator: Replicator,
}

impl Platform {
    pub fn new(config: &AppConfig, stores: Stores) -> Result<Self> {
        let passwords = Arc::new(
            PasswordService::from_config(&config.auth.password)
                .context("Invalid password hashing parameters")?,
        );
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config.auth.jwt)));

        Ok(Self::from_services(stores, passwords, auth))
    }

    pub fn from_services(
        stores: Stores,
        passwords: Arc<PasswordService>,
        auth: Arc<AuthService>,
    ) -> Self {
        let Stores {
            unit_of_work,
            users,
            blogs,
            replicator,
        } = stores;

        Self {
            register_user: Arc::new(RegisterUserUseCase::new(
                unit_of_work.clone(),
                users.clone(),
                passwords.clone(),
                auth.clone(),
                replicator.clone(),
            )),
            login: Arc::new(LoginUseCase::new(users.clone(), passwords.clone(), auth.clone())),
            verify_token: Arc::new(VerifyTokenUseCase::new(users.clone(), auth)),
            get_profile: Arc::new(GetProfileUseCase::new(users.clone())),
            update_profile: Arc::new(UpdateProfileUseCase::new(
                unit_of_work.clone(),
                users,
                passwords,
                replicator.clone(),
            )),
            create_blog: Arc::new(CreateBlogUseCase::new(
                unit_of_work,
                blogs.clone(),
                replicator.clone(),
            )),
            list_blogs: Arc::new(ListBlogsUseCase::new(blogs)),
            replicator,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quill API",
        version = "0.1.0",
        description = "Users, authentication and blogs"
    ),
    modifiers(&BearerAuth)
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut OpenApiDoc) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// All API routes, the OpenAPI document at `/q/openapi`, and the auth layer.
pub fn platform_router(platform: &Platform) -> Router {
    let users_state = UsersState {
        register_use_case: platform.register_user.clone(),
        get_profile_use_case: platform.get_profile.clone(),
        update_profile_use_case: platform.update_profile.clone(),
    };
    let auth_state = AuthApiState {
        login_use_case: platform.login.clone(),
    };
    let blogs_state = BlogsState {
        create_use_case: platform.create_blog.clone(),
        list_use_case: platform.list_blogs.clone(),
    };

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(health_router())
        .merge(users_router(users_state))
        .merge(auth_router(auth_state))
        .merge(blogs_router(blogs_state))
        .split_for_parts();

    let openapi = Arc::new(openapi);

    router
        .route(
            "/q/openapi",
            get(move || {
                let openapi = openapi.clone();
                async move { Json(openapi.as_ref().clone()) }
            }),
        )
        .layer(AuthLayer::new(AppState {
            verify_token: platform.verify_token.clone(),
        }))
}
