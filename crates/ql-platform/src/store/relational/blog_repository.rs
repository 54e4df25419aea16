use async_trait::async_trait;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::entity::blog;
use super::RelationalStore;
use crate::store::StoreError;
use crate::{Blog, BlogRepository, ExecutionContext};

async fn insert<C: ConnectionTrait>(conn: &C, b: &Blog) -> Result<(), StoreError> {
    blog::Entity::insert(blog::ActiveModel::from(b))
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn by_author<C: ConnectionTrait>(conn: &C, author_id: Uuid) -> Result<Vec<Blog>, StoreError> {
    let models = blog::Entity::find()
        .filter(blog::Column::AuthorId.eq(author_id))
        .order_by_desc(blog::Column::CreatedAt)
        .all(conn)
        .await?;
    Ok(models.into_iter().map(Blog::from).collect())
}

#[async_trait]
impl BlogRepository for RelationalStore {
    async fn create(&self, ctx: &ExecutionContext, blog: &Blog) -> Result<(), StoreError> {
        on_connection!(self, ctx, |conn| insert(conn, blog).await)
    }

    async fn find_all(&self, ctx: &ExecutionContext, author_id: Uuid) -> Result<Vec<Blog>, StoreError> {
        on_connection!(self, ctx, |conn| by_author(conn, author_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::sqlite_store;
    use super::*;
    use crate::usecase::Principal;

    #[tokio::test]
    async fn test_find_all_is_scoped_to_author_and_newest_first() {
        let store = sqlite_store().await;
        let ctx = ExecutionContext::create();
        let alice = Principal::new(Uuid::new_v4(), "alice");
        let bob = Principal::new(Uuid::new_v4(), "bob");

        let mut older = Blog::new(&alice, "older");
        older.created_at -= chrono::Duration::minutes(5);
        let newer = Blog::new(&alice, "newer");
        let foreign = Blog::new(&bob, "bob's");

        for b in [&older, &newer, &foreign] {
            store.create(&ctx, b).await.unwrap();
        }

        let blogs = store.find_all(&ctx, alice.user_id).await.unwrap();
        assert_eq!(blogs, vec![newer, older]);
    }
}
