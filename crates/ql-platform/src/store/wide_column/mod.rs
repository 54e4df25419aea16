//! Wide-column store (ScyllaDB / Cassandra)
//!
//! Users live in `users` keyed by id, with a `users_by_username` lookup
//! table. Blogs live in `blogs_by_author`, partitioned by author and
//! clustered newest first.
//!
//! There are no multi-statement transactions here. The unit of work hands
//! out pass-through transactions, every write applies immediately, and
//! username uniqueness rests on the use case's pre-check.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::statement::prepared::PreparedStatement;
use tracing::info;
use uuid::Uuid;

use ql_config::WideColumnConfig;

use super::replication::ReplicaSink;
use super::StoreError;
use crate::usecase::transaction::TxKind;
use crate::usecase::{ExecutionContext, TxConnection, UnitOfWork};
use crate::{Blog, User};

mod blog_repository;
mod user_repository;

type UserRow = (Uuid, String, String, String, i64, i64);
type BlogRow = (Uuid, i64, Uuid, String, String);

fn schema_statements(keyspace: &str, replication_factor: u32) -> Vec<String> {
    vec![
        format!(
            "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH replication = \
             {{'class': 'SimpleStrategy', 'replication_factor': {replication_factor}}}"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {keyspace}.users (\
             id uuid PRIMARY KEY, name text, username text, password_hash text, \
             created_at bigint, updated_at bigint)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {keyspace}.users_by_username (\
             username text PRIMARY KEY, user_id uuid)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {keyspace}.blogs_by_author (\
             author_id uuid, created_at bigint, id uuid, username text, content text, \
             PRIMARY KEY ((author_id), created_at, id)) \
             WITH CLUSTERING ORDER BY (created_at DESC, id DESC)"
        ),
    ]
}

/// Prepared statements, bound to one keyspace.
struct Statements {
    insert_user: PreparedStatement,
    select_user: PreparedStatement,
    insert_username: PreparedStatement,
    select_username: PreparedStatement,
    delete_username: PreparedStatement,
    insert_blog: PreparedStatement,
    select_blogs: PreparedStatement,
}

impl Statements {
    async fn prepare(session: &Session, ks: &str) -> Result<Self, StoreError> {
        let prepare = |cql: String| async move {
            session.prepare(cql).await.map_err(StoreError::wide_column)
        };

        Ok(Self {
            insert_user: prepare(format!(
                "INSERT INTO {ks}.users (id, name, username, password_hash, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?)"
            ))
            .await?,
            select_user: prepare(format!(
                "SELECT id, name, username, password_hash, created_at, updated_at \
                 FROM {ks}.users WHERE id = ?"
            ))
            .await?,
            insert_username: prepare(format!(
                "INSERT INTO {ks}.users_by_username (username, user_id) VALUES (?, ?)"
            ))
            .await?,
            select_username: prepare(format!(
                "SELECT user_id FROM {ks}.users_by_username WHERE username = ?"
            ))
            .await?,
            delete_username: prepare(format!(
                "DELETE FROM {ks}.users_by_username WHERE username = ?"
            ))
            .await?,
            insert_blog: prepare(format!(
                "INSERT INTO {ks}.blogs_by_author (author_id, created_at, id, username, content) \
                 VALUES (?, ?, ?, ?, ?)"
            ))
            .await?,
            select_blogs: prepare(format!(
                "SELECT author_id, created_at, id, username, content \
                 FROM {ks}.blogs_by_author WHERE author_id = ?"
            ))
            .await?,
        })
    }
}

#[derive(Clone)]
pub struct WideColumnStore {
    session: Arc<Session>,
    statements: Arc<Statements>,
    keyspace: String,
}

impl std::fmt::Debug for WideColumnStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WideColumnStore")
            .field("keyspace", &self.keyspace)
            .finish()
    }
}

impl WideColumnStore {
    /// Connect, create the keyspace and tables when missing, and prepare
    /// every statement.
    pub async fn connect(config: &WideColumnConfig) -> Result<Self, StoreError> {
        let session = SessionBuilder::new()
            .known_nodes(&config.nodes)
            .build()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        for cql in schema_statements(&config.keyspace, config.replication_factor) {
            session
                .query_unpaged(cql, ())
                .await
                .map_err(StoreError::wide_column)?;
        }

        let statements = Statements::prepare(&session, &config.keyspace).await?;

        info!(
            nodes = ?config.nodes,
            keyspace = %config.keyspace,
            "Connected to wide-column store"
        );

        Ok(Self {
            session: Arc::new(session),
            statements: Arc::new(statements),
            keyspace: config.keyspace.clone(),
        })
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Accept no binding or a pass-through one; reject any other store's.
    async fn check_binding(&self, ctx: &ExecutionContext) -> Result<(), StoreError> {
        if let Some(binding) = ctx.transaction() {
            let guard = binding.connection().await?;
            if !matches!(*guard, TxKind::PassThrough) {
                return Err(StoreError::ForeignTransaction);
            }
        }
        Ok(())
    }

    async fn load_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let result = self
            .session
            .execute_unpaged(&self.statements.select_user, (id,))
            .await
            .map_err(StoreError::wide_column)?;
        let row = result
            .into_rows_result()
            .map_err(StoreError::wide_column)?
            .maybe_first_row::<UserRow>()
            .map_err(StoreError::wide_column)?;
        row.map(user_from_row).transpose()
    }

    async fn user_id_for(&self, username: &str) -> Result<Option<Uuid>, StoreError> {
        let result = self
            .session
            .execute_unpaged(&self.statements.select_username, (username,))
            .await
            .map_err(StoreError::wide_column)?;
        let row = result
            .into_rows_result()
            .map_err(StoreError::wide_column)?
            .maybe_first_row::<(Uuid,)>()
            .map_err(StoreError::wide_column)?;
        Ok(row.map(|(id,)| id))
    }

    /// Write the user row and its username entry, dropping the entry for a
    /// previous username.
    async fn upsert_user(&self, user: &User, previous_username: Option<&str>) -> Result<(), StoreError> {
        self.session
            .execute_unpaged(
                &self.statements.insert_user,
                (
                    user.id,
                    &user.name,
                    &user.username,
                    &user.password_hash,
                    user.created_at.timestamp_micros(),
                    user.updated_at.timestamp_micros(),
                ),
            )
            .await
            .map_err(StoreError::wide_column)?;

        if let Some(old) = previous_username.filter(|old| *old != user.username) {
            self.session
                .execute_unpaged(&self.statements.delete_username, (old,))
                .await
                .map_err(StoreError::wide_column)?;
        }

        self.session
            .execute_unpaged(&self.statements.insert_username, (&user.username, user.id))
            .await
            .map_err(StoreError::wide_column)?;
        Ok(())
    }

    async fn insert_blog(&self, blog: &Blog) -> Result<(), StoreError> {
        self.session
            .execute_unpaged(
                &self.statements.insert_blog,
                (
                    blog.author_id,
                    blog.created_at.timestamp_micros(),
                    blog.id,
                    &blog.username,
                    &blog.content,
                ),
            )
            .await
            .map_err(StoreError::wide_column)?;
        Ok(())
    }

    async fn blogs_of(&self, author_id: Uuid) -> Result<Vec<Blog>, StoreError> {
        let result = self
            .session
            .execute_unpaged(&self.statements.select_blogs, (author_id,))
            .await
            .map_err(StoreError::wide_column)?;
        let rows = result.into_rows_result().map_err(StoreError::wide_column)?;

        rows.rows::<BlogRow>()
            .map_err(StoreError::wide_column)?
            .map(|row| row.map_err(StoreError::wide_column).and_then(blog_from_row))
            .collect()
    }
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::WideColumn(format!("timestamp out of range: {micros}")))
}

fn user_from_row(row: UserRow) -> Result<User, StoreError> {
    let (id, name, username, password_hash, created_at, updated_at) = row;
    Ok(User {
        id,
        name,
        username,
        password_hash,
        created_at: from_micros(created_at)?,
        updated_at: from_micros(updated_at)?,
    })
}

fn blog_from_row(row: BlogRow) -> Result<Blog, StoreError> {
    let (author_id, created_at, id, username, content) = row;
    Ok(Blog {
        id,
        author_id,
        username,
        content,
        created_at: from_micros(created_at)?,
    })
}

#[async_trait]
impl UnitOfWork for WideColumnStore {
    fn store_name(&self) -> &'static str {
        "wide_column"
    }

    async fn open(&self) -> Result<TxConnection, StoreError> {
        Ok(TxConnection::pass_through())
    }
}

#[async_trait]
impl ReplicaSink for WideColumnStore {
    fn name(&self) -> &'static str {
        "wide_column"
    }

    async fn replicate_user(&self, user: &User) -> Result<(), StoreError> {
        let previous = self.load_user(user.id).await?;
        self.upsert_user(user, previous.as_ref().map(|u| u.username.as_str()))
            .await
    }

    async fn replicate_blog(&self, blog: &Blog) -> Result<(), StoreError> {
        self.insert_blog(blog).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    #[test]
    fn test_schema_uses_keyspace_and_replication_factor() {
        let statements = schema_statements("blogdb", 3);
        assert_eq!(statements.len(), 4);
        assert!(statements[0].contains("'replication_factor': 3"));
        assert!(statements[1..].iter().all(|s| s.contains("blogdb.")));
        assert!(statements[3].contains("CLUSTERING ORDER BY (created_at DESC"));
    }

    #[test]
    fn test_user_row_round_trips_timestamps() {
        let user = User::new("Alice", "alice", "hash");
        let row: UserRow = (
            user.id,
            user.name.clone(),
            user.username.clone(),
            user.password_hash.clone(),
            user.created_at.timestamp_micros(),
            user.updated_at.timestamp_micros(),
        );
        assert_eq!(user_from_row(row).unwrap(), user);
    }

    #[test]
    fn test_blog_row_conversion() {
        let created_at = Utc::now().trunc_subsecs(6);
        let (id, author_id) = (Uuid::new_v4(), Uuid::new_v4());
        let blog = blog_from_row((
            author_id,
            created_at.timestamp_micros(),
            id,
            "alice".into(),
            "hello".into(),
        ))
        .unwrap();

        assert_eq!(blog.id, id);
        assert_eq!(blog.author_id, author_id);
        assert_eq!(blog.created_at, created_at);
    }

    #[test]
    fn test_out_of_range_timestamp_is_an_error() {
        assert!(matches!(from_micros(i64::MAX), Err(StoreError::WideColumn(_))));
    }
}
