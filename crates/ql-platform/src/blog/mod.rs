//! Blog Aggregate

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

pub use api::{blogs_router, BlogsState};
pub use entity::Blog;
pub use repository::BlogRepository;
