//! Transaction
//!
//! A [`Transaction`] is the owned handle a use case receives from
//! [`UnitOfWork::begin`](super::UnitOfWork::begin). The matching
//! [`TxBinding`] travels inside the [`ExecutionContext`](super::ExecutionContext)
//! so repositories reach the same store transaction without seeing the handle.
//!
//! `commit` and `rollback` consume the handle. Dropping a handle that was
//! neither committed nor rolled back rolls the transaction back, which covers
//! `?` early returns and panics.

use std::fmt;
use std::sync::Arc;

use sea_orm::DatabaseTransaction;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::store::memory::MemoryTx;
use crate::store::StoreError;

/// Store-specific state of an open transaction.
pub(crate) enum TxKind {
    Relational(DatabaseTransaction),
    Memory(MemoryTx),
    /// Stores without multi-statement atomicity; writes apply immediately.
    PassThrough,
    Closed,
}

impl TxKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Relational(_) => "relational",
            Self::Memory(_) => "memory",
            Self::PassThrough => "pass_through",
            Self::Closed => "closed",
        }
    }

    async fn commit(self) -> Result<(), StoreError> {
        match self {
            Self::Relational(tx) => tx.commit().await.map_err(StoreError::from),
            Self::Memory(tx) => tx.commit(),
            Self::PassThrough => Ok(()),
            Self::Closed => Err(StoreError::TransactionClosed),
        }
    }

    async fn rollback(self) -> Result<(), StoreError> {
        match self {
            Self::Relational(tx) => tx.rollback().await.map_err(StoreError::from),
            Self::Memory(tx) => {
                tx.rollback();
                Ok(())
            }
            Self::PassThrough => Ok(()),
            Self::Closed => Err(StoreError::TransactionClosed),
        }
    }
}

/// A freshly opened store transaction, produced by a unit of work.
pub struct TxConnection(pub(crate) TxKind);

impl TxConnection {
    pub(crate) fn relational(tx: DatabaseTransaction) -> Self {
        Self(TxKind::Relational(tx))
    }

    pub(crate) fn memory(tx: MemoryTx) -> Self {
        Self(TxKind::Memory(tx))
    }

    /// Transaction for a store that applies every write on its own.
    pub fn pass_through() -> Self {
        Self(TxKind::PassThrough)
    }
}

struct TxSlot {
    id: Uuid,
    kind: Mutex<TxKind>,
}

/// The context-side view of an open transaction.
///
/// Cloning shares the same slot, so every context derived from one
/// `begin` resolves to the same store transaction.
#[derive(Clone)]
pub struct TxBinding(Arc<TxSlot>);

impl TxBinding {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    /// Lock the store transaction for one repository call.
    pub(crate) async fn connection(&self) -> Result<MutexGuard<'_, TxKind>, StoreError> {
        let guard = self.0.kind.lock().await;
        if matches!(*guard, TxKind::Closed) {
            return Err(StoreError::TransactionClosed);
        }
        Ok(guard)
    }

    async fn take(&self) -> TxKind {
        let mut guard = self.0.kind.lock().await;
        std::mem::replace(&mut *guard, TxKind::Closed)
    }
}

impl fmt::Debug for TxBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxBinding").field("id", &self.0.id).finish()
    }
}

/// Owned handle of one in-flight transaction.
#[must_use = "a transaction rolls back when dropped without commit"]
pub struct Transaction {
    binding: TxBinding,
    finished: bool,
}

impl Transaction {
    pub(crate) fn start(connection: TxConnection) -> (Self, TxBinding) {
        let binding = TxBinding(Arc::new(TxSlot {
            id: Uuid::new_v4(),
            kind: Mutex::new(connection.0),
        }));
        let tx = Self {
            binding: binding.clone(),
            finished: false,
        };
        (tx, binding)
    }

    pub fn id(&self) -> Uuid {
        self.binding.id()
    }

    pub async fn commit(mut self) -> Result<(), StoreError> {
        self.finished = true;
        let kind = self.binding.take().await;
        let store = kind.label();

        let result = kind.commit().await;
        match &result {
            Ok(()) => debug!(tx_id = %self.id(), store, "Transaction committed"),
            Err(e) => error!(tx_id = %self.id(), store, error = %e, "Transaction commit failed"),
        }
        result
    }

    pub async fn rollback(mut self) -> Result<(), StoreError> {
        self.finished = true;
        let kind = self.binding.take().await;
        let store = kind.label();

        let result = kind.rollback().await;
        match &result {
            Ok(()) => debug!(tx_id = %self.id(), store, "Transaction rolled back"),
            Err(e) => warn!(tx_id = %self.id(), store, error = %e, "Transaction rollback failed"),
        }
        result
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        match self.binding.0.kind.try_lock() {
            Ok(mut guard) => {
                let kind = std::mem::replace(&mut *guard, TxKind::Closed);
                debug!(tx_id = %self.binding.id(), store = kind.label(), "Rolling back unfinished transaction");
                match kind {
                    // sea-orm starts the rollback when its transaction is dropped
                    TxKind::Relational(tx) => drop(tx),
                    TxKind::Memory(tx) => tx.rollback(),
                    TxKind::PassThrough | TxKind::Closed => {}
                }
            }
            Err(_) => {
                warn!(tx_id = %self.binding.id(), "Transaction dropped while a repository call holds it");
            }
        }
    }
}
