//! Blog Repository contract

use async_trait::async_trait;
use uuid::Uuid;

use crate::store::StoreError;
use crate::usecase::ExecutionContext;
use crate::Blog;

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, ctx: &ExecutionContext, blog: &Blog) -> Result<(), StoreError>;

    /// All blogs written by `author_id`, newest first.
    async fn find_all(&self, ctx: &ExecutionContext, author_id: Uuid) -> Result<Vec<Blog>, StoreError>;
}
