use async_trait::async_trait;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, SqlErr};
use uuid::Uuid;

use super::entity::user;
use super::RelationalStore;
use crate::store::StoreError;
use crate::{ExecutionContext, User, UserRepository};

fn classify(err: DbErr, username: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::duplicate_username(username),
        _ => err.into(),
    }
}

async fn insert<C: ConnectionTrait>(conn: &C, u: &User) -> Result<(), StoreError> {
    user::Entity::insert(user::ActiveModel::from(u))
        .exec_without_returning(conn)
        .await
        .map_err(|e| classify(e, &u.username))?;
    Ok(())
}

async fn by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Option<User>, StoreError> {
    let model = user::Entity::find_by_id(id).one(conn).await?;
    Ok(model.map(User::from))
}

async fn by_username<C: ConnectionTrait>(conn: &C, username: &str) -> Result<Option<User>, StoreError> {
    let model = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(conn)
        .await?;
    Ok(model.map(User::from))
}

async fn replace<C: ConnectionTrait>(conn: &C, u: &User) -> Result<bool, StoreError> {
    let mut changes = user::ActiveModel::from(u);
    changes.id = sea_orm::ActiveValue::NotSet;
    changes.created_at = sea_orm::ActiveValue::NotSet;

    let result = user::Entity::update_many()
        .set(changes)
        .filter(user::Column::Id.eq(u.id))
        .exec(conn)
        .await
        .map_err(|e| classify(e, &u.username))?;
    Ok(result.rows_affected > 0)
}

#[async_trait]
impl UserRepository for RelationalStore {
    async fn create(&self, ctx: &ExecutionContext, user: &User) -> Result<(), StoreError> {
        on_connection!(self, ctx, |conn| insert(conn, user).await)
    }

    async fn find_by_id(&self, ctx: &ExecutionContext, id: Uuid) -> Result<Option<User>, StoreError> {
        on_connection!(self, ctx, |conn| by_id(conn, id).await)
    }

    async fn find_by_username(
        &self,
        ctx: &ExecutionContext,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        on_connection!(self, ctx, |conn| by_username(conn, username).await)
    }

    async fn update(&self, ctx: &ExecutionContext, user: &User) -> Result<bool, StoreError> {
        on_connection!(self, ctx, |conn| replace(conn, user).await)
    }
}
