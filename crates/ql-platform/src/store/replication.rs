//! Best-effort replication to a secondary store
//!
//! After a use case commits on the primary store it hands the written
//! entity to the [`Replicator`]. Writes queue on one channel per replicator
//! and a single background worker applies them in commit order, so a later
//! update never lands before an earlier one. The copy is at most once and not
//! transactional with the primary: a failure is logged, counted, and never
//! reaches the caller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::StoreError;
use crate::{Blog, User};

/// A store that accepts copies of committed entities.
///
/// Writes must be idempotent upserts keyed by entity id.
#[async_trait]
pub trait ReplicaSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn replicate_user(&self, user: &User) -> Result<(), StoreError>;

    async fn replicate_blog(&self, blog: &Blog) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct Counters {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Replication outcome counts since startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplicationStats {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

enum ReplicaWrite {
    User(User),
    Blog(Blog),
    /// Answered once every write queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

/// Hands committed writes to an optional replica.
///
/// Without a sink every call is a no-op.
#[derive(Clone, Default)]
pub struct Replicator {
    sink: Option<Arc<dyn ReplicaSink>>,
    counters: Arc<Counters>,
    queue: Arc<OnceLock<mpsc::UnboundedSender<ReplicaWrite>>>,
}

impl fmt::Debug for Replicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replicator")
            .field("sink", &self.sink.as_ref().map(|s| s.name()))
            .field("stats", &self.stats())
            .finish()
    }
}

impl Replicator {
    pub fn new(sink: Arc<dyn ReplicaSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn stats(&self) -> ReplicationStats {
        ReplicationStats {
            attempted: self.counters.attempted.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Queue a committed user for the replica. Returns whether it was queued.
    ///
    /// Non-critical: the outcome only shows up in logs, metrics, and
    /// [`Replicator::stats`].
    pub fn replicate_user(&self, user: &User) -> bool {
        self.enqueue(ReplicaWrite::User(user.clone()))
    }

    /// Queue a committed blog for the replica.
    pub fn replicate_blog(&self, blog: &Blog) -> bool {
        self.enqueue(ReplicaWrite::Blog(blog.clone()))
    }

    /// Wait until every write queued so far has been applied or failed.
    pub async fn flush(&self) {
        let (done, applied) = oneshot::channel();
        if self.enqueue(ReplicaWrite::Flush(done)) {
            let _ = applied.await;
        }
    }

    /// Copy a user now, absorbing any failure.
    pub async fn write_user(&self, user: &User) {
        if let Some(sink) = &self.sink {
            copy_user(sink.as_ref(), &self.counters, user).await;
        }
    }

    pub async fn write_blog(&self, blog: &Blog) {
        if let Some(sink) = &self.sink {
            copy_blog(sink.as_ref(), &self.counters, blog).await;
        }
    }

    /// The worker starts on first use, inside the caller's runtime.
    fn enqueue(&self, write: ReplicaWrite) -> bool {
        let Some(sink) = &self.sink else { return false };

        let queue = self.queue.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(run_worker(sink.clone(), self.counters.clone(), rx));
            tx
        });

        if queue.send(write).is_err() {
            warn!(replica = sink.name(), "Replication worker stopped; write dropped");
            return false;
        }
        true
    }
}

/// Applies queued writes one at a time until every sender is gone.
async fn run_worker(
    sink: Arc<dyn ReplicaSink>,
    counters: Arc<Counters>,
    mut rx: mpsc::UnboundedReceiver<ReplicaWrite>,
) {
    debug!(replica = sink.name(), "Replication worker started");

    while let Some(write) = rx.recv().await {
        match write {
            ReplicaWrite::User(user) => copy_user(sink.as_ref(), &counters, &user).await,
            ReplicaWrite::Blog(blog) => copy_blog(sink.as_ref(), &counters, &blog).await,
            ReplicaWrite::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!(replica = sink.name(), "Replication worker stopped");
}

async fn copy_user(sink: &dyn ReplicaSink, counters: &Counters, user: &User) {
    let result = sink.replicate_user(user).await;
    record(counters, sink.name(), "user", &user.id.to_string(), result);
}

async fn copy_blog(sink: &dyn ReplicaSink, counters: &Counters, blog: &Blog) {
    let result = sink.replicate_blog(blog).await;
    record(counters, sink.name(), "blog", &blog.id.to_string(), result);
}

fn record(
    counters: &Counters,
    replica: &'static str,
    entity: &'static str,
    id: &str,
    result: Result<(), StoreError>,
) {
    counters.attempted.fetch_add(1, Ordering::Relaxed);
    metrics::counter!("quill_replication_writes_total", "replica" => replica, "entity" => entity)
        .increment(1);

    match result {
        Ok(()) => {
            counters.succeeded.fetch_add(1, Ordering::Relaxed);
            debug!(replica, entity, id, "Replicated");
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("quill_replication_failures_total", "replica" => replica, "entity" => entity)
                .increment(1);
            warn!(replica, entity, id, error = %e, "Replication failed; primary write stands");
        }
    }
}
