//! Blog Operations

pub mod create;
pub mod list;

pub use create::{CreateBlogCommand, CreateBlogUseCase, CONTENT_MAX_CHARS};
pub use list::ListBlogsUseCase;
