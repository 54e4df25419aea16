//! Quill Platform
//!
//! Core of the blog backend:
//! - Users: registration, login, profile
//! - Blogs: create and list the caller's own posts
//! - Unit of work over the configured primary store
//! - Best-effort replication to a wide-column store
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access traits
//! - `api` - REST endpoints
//! - `operations` - Use case operations
//!
//! Store implementations of the repository traits live under [`store`].

// Aggregates
pub mod blog;
pub mod user;

// Authentication
pub mod auth;

// Infrastructure
pub mod bootstrap;
pub mod shared;
pub mod store;
pub mod usecase;

#[cfg(test)]
pub(crate) mod testing;

pub use shared::error::{PlatformError, Result};

pub use usecase::{
    ExecutionContext, Principal, Transaction, UnitOfWork, UseCaseError, UseCaseResult,
};

pub use blog::entity::Blog;
pub use user::entity::User;

pub use blog::repository::BlogRepository;
pub use user::repository::UserRepository;

pub use auth::auth_service::{AccessTokenClaims, AuthService};
pub use auth::password_service::PasswordService;

pub use bootstrap::{platform_router, Platform, Stores};
pub use store::{StoreError, Replicator};
