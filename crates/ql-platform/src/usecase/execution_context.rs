//! Execution Context
//!
//! Request-scoped carrier threaded through every use case and repository
//! call of one operation. It carries tracing IDs, the authenticated
//! principal, and the transaction bound by a unit of work, if any.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::UseCaseError;
use super::transaction::TxBinding;

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
}

impl Principal {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// Context for a use case execution.
///
/// Immutable: every `with_*`/`authenticated` call returns a new context.
/// Derived contexts keep the parent's transaction binding, and only
/// [`UnitOfWork::begin`](super::UnitOfWork::begin) can add one.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution
    pub execution_id: String,
    /// ID for distributed tracing, usually from the inbound request
    pub correlation_id: String,
    /// When the execution was initiated
    pub initiated_at: DateTime<Utc>,
    principal: Option<Principal>,
    transaction: Option<TxBinding>,
}

fn new_execution_id() -> String {
    format!("exec-{}", Uuid::new_v4().simple())
}

impl ExecutionContext {
    /// Context for a fresh, unauthenticated request.
    ///
    /// The correlation ID starts as the execution ID.
    pub fn create() -> Self {
        let execution_id = new_execution_id();
        Self {
            correlation_id: execution_id.clone(),
            execution_id,
            initiated_at: Utc::now(),
            principal: None,
            transaction: None,
        }
    }

    /// Context for a fresh request with an upstream correlation ID.
    pub fn with_correlation(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            ..Self::create()
        }
    }

    /// Derive a context acting as `principal`.
    pub fn authenticated(&self, principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            ..self.clone()
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// The principal, or `UnauthorizedError` for anonymous contexts.
    pub fn require_principal(&self) -> Result<&Principal, UseCaseError> {
        self.principal.as_ref().ok_or_else(|| {
            UseCaseError::unauthorized("AUTHENTICATION_REQUIRED", "Authentication is required")
        })
    }

    /// The bound transaction, or `None` when no unit of work began on this
    /// chain. Repositories then use their default connection.
    pub fn transaction(&self) -> Option<&TxBinding> {
        self.transaction.as_ref()
    }

    pub(crate) fn bind_transaction(&self, binding: TxBinding) -> Self {
        Self {
            transaction: Some(binding),
            ..self.clone()
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::create()
    }
}
