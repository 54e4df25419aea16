use async_trait::async_trait;
use uuid::Uuid;

use super::WideColumnStore;
use crate::store::StoreError;
use crate::{ExecutionContext, User, UserRepository};

#[async_trait]
impl UserRepository for WideColumnStore {
    async fn create(&self, ctx: &ExecutionContext, user: &User) -> Result<(), StoreError> {
        self.check_binding(ctx).await?;
        self.upsert_user(user, None).await
    }

    async fn find_by_id(&self, ctx: &ExecutionContext, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check_binding(ctx).await?;
        self.load_user(id).await
    }

    async fn find_by_username(
        &self,
        ctx: &ExecutionContext,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        self.check_binding(ctx).await?;
        match self.user_id_for(username).await? {
            Some(id) => self.load_user(id).await,
            None => Ok(None),
        }
    }

    async fn update(&self, ctx: &ExecutionContext, user: &User) -> Result<bool, StoreError> {
        self.check_binding(ctx).await?;
        let Some(current) = self.load_user(user.id).await? else {
            return Ok(false);
        };
        self.upsert_user(user, Some(&current.username)).await?;
        Ok(true)
    }
}
