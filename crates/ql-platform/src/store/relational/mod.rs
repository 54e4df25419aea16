//! Relational store (sea-orm)
//!
//! The primary store by default. Every transaction is a real database
//! transaction, so a use case's writes land together or not at all.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, TransactionTrait};
use tracing::info;

use ql_config::DatabaseConfig;

use super::StoreError;
use crate::usecase::{TxConnection, UnitOfWork};

/// Run `$body` against the context's transaction when one is bound,
/// otherwise against the store's pooled connection.
///
/// `$body` is expanded once per connection type, so it should call a
/// helper that is generic over `ConnectionTrait`.
macro_rules! on_connection {
    ($store:expr, $ctx:expr, |$conn:ident| $body:expr) => {{
        match $ctx.transaction() {
            Some(binding) => {
                let guard = binding.connection().await?;
                match &*guard {
                    $crate::usecase::transaction::TxKind::Relational($conn) => $body,
                    _ => Err($crate::store::StoreError::ForeignTransaction),
                }
            }
            None => {
                let $conn = &$store.db;
                $body
            }
        }
    }};
}

pub mod entity;
mod blog_repository;
mod schema;
mod user_repository;

#[derive(Debug, Clone)]
pub struct RelationalStore {
    db: DatabaseConnection,
}

impl RelationalStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(config.sqlx_logging);

        let db = Database::connect(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Connected to relational store"
        );
        Ok(Self { db })
    }

    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        schema::ensure_schema(&self.db).await
    }
}

#[async_trait]
impl UnitOfWork for RelationalStore {
    fn store_name(&self) -> &'static str {
        "relational"
    }

    async fn open(&self) -> Result<TxConnection, StoreError> {
        let tx = self
            .db
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(TxConnection::relational(tx))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sea_orm::{ConnectOptions, Database};

    use super::RelationalStore;

    /// Private in-memory SQLite database with the schema applied.
    ///
    /// One pooled connection: every `sqlite::memory:` connection is its own
    /// database.
    pub(crate) async fn sqlite_store() -> RelationalStore {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);

        let db = Database::connect(options).await.unwrap();
        let store = RelationalStore::from_connection(db);
        store.ensure_schema().await.unwrap();
        store
    }
}
