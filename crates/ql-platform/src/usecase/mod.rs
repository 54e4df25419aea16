//! Use Case Infrastructure
//!
//! - `UseCaseError` - categorized error types for consistent handling
//! - `ExecutionContext` - tracing IDs, principal, and bound transaction
//! - `UnitOfWork` / `Transaction` - one store transaction per operation

pub mod error;
pub mod execution_context;
pub mod transaction;
pub mod unit_of_work;

pub use error::UseCaseError;
pub use execution_context::{ExecutionContext, Principal};
pub use transaction::{Transaction, TxBinding, TxConnection};
pub use unit_of_work::UnitOfWork;

pub type UseCaseResult<T> = Result<T, UseCaseError>;
