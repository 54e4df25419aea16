//! Table bootstrap
//!
//! Creates the `users` and `blogs` tables (and the author index) from the
//! entity definitions when they are missing. Safe to run on every start.

use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};
use tracing::info;

use super::entity::{blog, user};
use crate::store::StoreError;

pub(super) async fn ensure_schema(db: &DatabaseConnection) -> Result<(), StoreError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut users = schema.create_table_from_entity(user::Entity);
    users.if_not_exists();
    db.execute(backend.build(&users)).await?;

    let mut blogs = schema.create_table_from_entity(blog::Entity);
    blogs.if_not_exists();
    db.execute(backend.build(&blogs)).await?;

    for mut index in schema.create_index_from_entity(blog::Entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    info!(backend = ?backend, "Relational schema ready");
    Ok(())
}
