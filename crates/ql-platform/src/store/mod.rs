//! Store adapters
//!
//! Each store implements [`UnitOfWork`](crate::usecase::UnitOfWork),
//! [`UserRepository`](crate::UserRepository) and
//! [`BlogRepository`](crate::BlogRepository):
//!
//! - [`relational`] - sea-orm over PostgreSQL (or any sea-orm backend)
//! - [`wide_column`] - Cassandra/ScyllaDB, no multi-statement transactions
//! - [`memory`] - process-local, for tests and local development
//!
//! [`replication`] copies committed writes to a secondary store.

use std::fmt::Display;

use thiserror::Error;

pub mod memory;
pub mod relational;
pub mod replication;
pub mod wide_column;

pub use memory::{MemoryStats, MemoryStore};
pub use relational::RelationalStore;
pub use replication::{ReplicaSink, ReplicationStats, Replicator};
pub use wide_column::WideColumnStore;

/// Repository-level failure, classified by the use case layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate {entity} with {field}={value}")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Transaction is no longer active")]
    TransactionClosed,

    #[error("Transaction belongs to a different store")]
    ForeignTransaction,

    #[error("A transaction is already bound to this context")]
    NestedTransaction,

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Wide-column store error: {0}")]
    WideColumn(String),
}

impl StoreError {
    pub fn wide_column(err: impl Display) -> Self {
        Self::WideColumn(err.to_string())
    }

    pub(crate) fn duplicate_username(username: &str) -> Self {
        Self::Conflict {
            entity: "user",
            field: "username",
            value: username.to_string(),
        }
    }
}
