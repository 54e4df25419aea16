//! Unit of Work
//!
//! Begins a store transaction and binds it into a child
//! [`ExecutionContext`] so every repository call made with that context
//! runs inside the same transaction.
//!
//! # Usage in a use case
//!
//! ```ignore
//! let (tx, tx_ctx) = self.unit_of_work.begin(ctx).await.map_err(UseCaseError::from_begin)?;
//!
//! // Any `?` below drops `tx`, which rolls back.
//! if self.users.find_by_username(&tx_ctx, &username).await?.is_some() {
//!     return Err(UseCaseError::conflict("USERNAME_EXISTS", "Username is already taken"));
//! }
//! self.users.create(&tx_ctx, &user).await?;
//!
//! tx.commit().await.map_err(UseCaseError::from_commit)?;
//! ```

use async_trait::async_trait;
use tracing::debug;

use super::execution_context::ExecutionContext;
use super::transaction::{Transaction, TxConnection};
use crate::store::StoreError;

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Store label used in logs.
    fn store_name(&self) -> &'static str;

    /// Open a new store transaction.
    ///
    /// Fails with [`StoreError::Unavailable`] when the store cannot hand
    /// one out (pool exhausted, network failure).
    async fn open(&self) -> Result<TxConnection, StoreError>;

    /// Begin a transaction and return it with a child of `parent` bound to it.
    ///
    /// A context that already carries a transaction is rejected with
    /// [`StoreError::NestedTransaction`]; nothing is opened in that case.
    async fn begin(
        &self,
        parent: &ExecutionContext,
    ) -> Result<(Transaction, ExecutionContext), StoreError> {
        if let Some(existing) = parent.transaction() {
            debug!(tx_id = %existing.id(), "Refusing to begin a nested transaction");
            return Err(StoreError::NestedTransaction);
        }

        let connection = self.open().await?;
        let (tx, binding) = Transaction::start(connection);

        debug!(
            tx_id = %tx.id(),
            store = self.store_name(),
            execution_id = %parent.execution_id,
            "Transaction started"
        );

        Ok((tx, parent.bind_transaction(binding)))
    }
}
