//! sea-orm entities for the relational store

use crate::{Blog, User};

pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        #[sea_orm(unique)]
        pub username: String,
        pub password_hash: String,
        pub created_at: ChronoDateTimeUtc,
        pub updated_at: ChronoDateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod blog {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "blogs")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(indexed)]
        pub author_id: Uuid,
        pub username: String,
        #[sea_orm(column_type = "Text")]
        pub content: String,
        pub created_at: ChronoDateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            username: m.username,
            password_hash: m.password_hash,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<&User> for user::ActiveModel {
    fn from(u: &User) -> Self {
        use sea_orm::ActiveValue::Set;
        Self {
            id: Set(u.id),
            name: Set(u.name.clone()),
            username: Set(u.username.clone()),
            password_hash: Set(u.password_hash.clone()),
            created_at: Set(u.created_at),
            updated_at: Set(u.updated_at),
        }
    }
}

impl From<blog::Model> for Blog {
    fn from(m: blog::Model) -> Self {
        Self {
            id: m.id,
            author_id: m.author_id,
            username: m.username,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

impl From<&Blog> for blog::ActiveModel {
    fn from(b: &Blog) -> Self {
        use sea_orm::ActiveValue::Set;
        Self {
            id: Set(b.id),
            author_id: Set(b.author_id),
            username: Set(b.username.clone()),
            content: Set(b.content.clone()),
            created_at: Set(b.created_at),
        }
    }
}
