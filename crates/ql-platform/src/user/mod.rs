//! User Aggregate
//!
//! Registration, login, token verification and profile management.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

pub use api::{users_router, UsersState};
pub use entity::User;
pub use repository::UserRepository;
