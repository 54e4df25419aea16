//! User Repository contract
//!
//! Every method takes the caller's [`ExecutionContext`]. When it carries a
//! transaction the call joins it, otherwise the store's default connection
//! is used.

use async_trait::async_trait;
use uuid::Uuid;

use crate::store::StoreError;
use crate::usecase::ExecutionContext;
use crate::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A taken username may surface as
    /// [`StoreError::Conflict`] on stores that enforce uniqueness.
    async fn create(&self, ctx: &ExecutionContext, user: &User) -> Result<(), StoreError>;

    async fn find_by_id(&self, ctx: &ExecutionContext, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_username(
        &self,
        ctx: &ExecutionContext,
        username: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Replace the stored user with the same id. Returns `false` when no
    /// such user exists.
    async fn update(&self, ctx: &ExecutionContext, user: &User) -> Result<bool, StoreError>;
}
