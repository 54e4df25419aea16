use async_trait::async_trait;
use uuid::Uuid;

use super::WideColumnStore;
use crate::store::StoreError;
use crate::{Blog, BlogRepository, ExecutionContext};

#[async_trait]
impl BlogRepository for WideColumnStore {
    async fn create(&self, ctx: &ExecutionContext, blog: &Blog) -> Result<(), StoreError> {
        self.check_binding(ctx).await?;
        self.insert_blog(blog).await
    }

    /// Rows come back in clustering order, newest first.
    async fn find_all(&self, ctx: &ExecutionContext, author_id: Uuid) -> Result<Vec<Blog>, StoreError> {
        self.check_binding(ctx).await?;
        self.blogs_of(author_id).await
    }
}
