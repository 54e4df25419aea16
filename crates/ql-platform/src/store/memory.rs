//! In-memory store
//!
//! Keeps users and blogs in process memory behind a lock. Transactions
//! stage their writes and apply them all at once on commit, so reads inside
//! a transaction see its own writes and a rollback leaves nothing behind.
//!
//! Fault switches (`fail_begin`, `fail_commit`, `fail_writes`) and the
//! begin/commit/rollback counters make it the store of choice for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::replication::ReplicaSink;
use super::StoreError;
use crate::usecase::transaction::TxKind;
use crate::usecase::{ExecutionContext, TxConnection, UnitOfWork};
use crate::{Blog, BlogRepository, User, UserRepository};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    blogs: Vec<Blog>,
}

#[derive(Debug, Clone)]
enum PendingWrite {
    CreateUser(User),
    UpdateUser(User),
    CreateBlog(Blog),
}

impl Tables {
    fn username_taken(&self, username: &str, except: Uuid) -> bool {
        self.users
            .values()
            .any(|u| u.id != except && u.username == username)
    }

    fn user_by_username(&self, username: &str) -> Option<User> {
        self.users.values().find(|u| u.username == username).cloned()
    }

    fn blogs_by_author(&self, author_id: Uuid) -> Vec<Blog> {
        let mut blogs: Vec<Blog> = self
            .blogs
            .iter()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect();
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        blogs
    }

    fn apply(&mut self, write: PendingWrite) -> Result<(), StoreError> {
        match write {
            PendingWrite::CreateUser(user) => {
                if self.users.contains_key(&user.id) || self.username_taken(&user.username, user.id) {
                    return Err(StoreError::duplicate_username(&user.username));
                }
                self.users.insert(user.id, user);
            }
            PendingWrite::UpdateUser(user) => {
                if self.username_taken(&user.username, user.id) {
                    return Err(StoreError::duplicate_username(&user.username));
                }
                self.users.insert(user.id, user);
            }
            PendingWrite::CreateBlog(blog) => self.blogs.push(blog),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: RwLock<Tables>,
    begins: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
    fail_begin: AtomicBool,
    fail_commit: AtomicBool,
    fail_writes: AtomicBool,
}

/// Snapshot of transaction counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStats {
    pub begins: u64,
    pub commits: u64,
    pub rollbacks: u64,
}

/// Transaction state of the memory store.
pub struct MemoryTx {
    state: Arc<MemoryState>,
    pending: Vec<PendingWrite>,
    finished: bool,
}

impl MemoryTx {
    /// Committed tables with this transaction's writes applied.
    fn view(&self) -> Result<Tables, StoreError> {
        let mut view = self.state.tables.read().clone();
        for write in &self.pending {
            view.apply(write.clone())?;
        }
        Ok(view)
    }

    fn stage(&mut self, write: PendingWrite) -> Result<(), StoreError> {
        self.view()?.apply(write.clone())?;
        self.pending.push(write);
        Ok(())
    }

    pub(crate) fn commit(mut self) -> Result<(), StoreError> {
        if self.state.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store rejected the commit".into()));
        }

        let pending = std::mem::take(&mut self.pending);
        {
            let mut tables = self.state.tables.write();
            let mut next = tables.clone();
            for write in pending {
                next.apply(write)?;
            }
            *tables = next;
        }

        self.finished = true;
        self.state.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub(crate) fn rollback(self) {
        // counted by Drop
        drop(self);
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.finished {
            debug!(discarded = self.pending.len(), "Memory transaction rolled back");
            self.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Process-local store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            begins: self.state.begins.load(Ordering::SeqCst),
            commits: self.state.commits.load(Ordering::SeqCst),
            rollbacks: self.state.rollbacks.load(Ordering::SeqCst),
        }
    }

    pub fn user_count(&self) -> usize {
        self.state.tables.read().users.len()
    }

    pub fn blog_count(&self) -> usize {
        self.state.tables.read().blogs.len()
    }

    /// Make `begin` fail with [`StoreError::Unavailable`].
    pub fn fail_begin(&self, on: bool) {
        self.state.fail_begin.store(on, Ordering::SeqCst);
    }

    /// Make every commit fail; the staged writes are discarded.
    pub fn fail_commit(&self, on: bool) {
        self.state.fail_commit.store(on, Ordering::SeqCst);
    }

    /// Make every create and update fail.
    pub fn fail_writes(&self, on: bool) {
        self.state.fail_writes.store(on, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store rejected the write".into()));
        }
        Ok(())
    }

    fn own_tx<'a>(&self, kind: &'a mut TxKind) -> Result<&'a mut MemoryTx, StoreError> {
        match kind {
            TxKind::Memory(tx) if Arc::ptr_eq(&tx.state, &self.state) => Ok(tx),
            _ => Err(StoreError::ForeignTransaction),
        }
    }

    async fn write(&self, ctx: &ExecutionContext, write: PendingWrite) -> Result<(), StoreError> {
        self.check_writable()?;
        match ctx.transaction() {
            Some(binding) => {
                let mut guard = binding.connection().await?;
                self.own_tx(&mut guard)?.stage(write)
            }
            None => self.state.tables.write().apply(write),
        }
    }

    async fn read<T: Send>(
        &self,
        ctx: &ExecutionContext,
        query: impl FnOnce(&Tables) -> T + Send,
    ) -> Result<T, StoreError> {
        match ctx.transaction() {
            Some(binding) => {
                let mut guard = binding.connection().await?;
                let view = self.own_tx(&mut guard)?.view()?;
                Ok(query(&view))
            }
            None => Ok(query(&self.state.tables.read())),
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn open(&self) -> Result<TxConnection, StoreError> {
        if self.state.fail_begin.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store refused a new transaction".into()));
        }

        self.state.begins.fetch_add(1, Ordering::SeqCst);
        Ok(TxConnection::memory(MemoryTx {
            state: self.state.clone(),
            pending: Vec::new(),
            finished: false,
        }))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, ctx: &ExecutionContext, user: &User) -> Result<(), StoreError> {
        self.write(ctx, PendingWrite::CreateUser(user.clone())).await
    }

    async fn find_by_id(&self, ctx: &ExecutionContext, id: Uuid) -> Result<Option<User>, StoreError> {
        self.read(ctx, |t| t.users.get(&id).cloned()).await
    }

    async fn find_by_username(
        &self,
        ctx: &ExecutionContext,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        self.read(ctx, |t| t.user_by_username(username)).await
    }

    async fn update(&self, ctx: &ExecutionContext, user: &User) -> Result<bool, StoreError> {
        let exists = self.read(ctx, |t| t.users.contains_key(&user.id)).await?;
        if !exists {
            return Ok(false);
        }
        self.write(ctx, PendingWrite::UpdateUser(user.clone())).await?;
        Ok(true)
    }
}

#[async_trait]
impl BlogRepository for MemoryStore {
    async fn create(&self, ctx: &ExecutionContext, blog: &Blog) -> Result<(), StoreError> {
        self.write(ctx, PendingWrite::CreateBlog(blog.clone())).await
    }

    async fn find_all(&self, ctx: &ExecutionContext, author_id: Uuid) -> Result<Vec<Blog>, StoreError> {
        self.read(ctx, |t| t.blogs_by_author(author_id)).await
    }
}

#[async_trait]
impl ReplicaSink for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn replicate_user(&self, user: &User) -> Result<(), StoreError> {
        self.check_writable()?;
        self.state.tables.write().users.insert(user.id, user.clone());
        Ok(())
    }

    async fn replicate_blog(&self, blog: &Blog) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut tables = self.state.tables.write();
        if !tables.blogs.iter().any(|b| b.id == blog.id) {
            tables.blogs.push(blog.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::Principal;

    fn user(username: &str) -> User {
        User::new("Test User", username, "$argon2id$v=19$hash")
    }

    #[tokio::test]
    async fn test_create_and_find_without_transaction() {
        let store = MemoryStore::new();
        let ctx = ExecutionContext::create();
        let alice = user("alice");

        UserRepository::create(&store, &ctx, &alice).await.unwrap();

        let found = store.find_by_username(&ctx, "alice").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
        assert!(store.find_by_id(&ctx, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        let ctx = ExecutionContext::create();

        UserRepository::create(&store, &ctx, &user("alice")).await.unwrap();
        let err = UserRepository::create(&store, &ctx, &user("alice")).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict { field: "username", .. }));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_transaction_reads_its_own_writes() {
        let store = MemoryStore::new();
        let outside = ExecutionContext::create();
        let (tx, tx_ctx) = store.begin(&outside).await.unwrap();
        let bob = user("bob");

        UserRepository::create(&store, &tx_ctx, &bob).await.unwrap();

        assert!(store.find_by_username(&tx_ctx, "bob").await.unwrap().is_some());
        assert!(store.find_by_username(&outside, "bob").await.unwrap().is_none());

        tx.commit().await.unwrap();
        assert!(store.find_by_username(&outside, "bob").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let (tx, tx_ctx) = store.begin(&ExecutionContext::create()).await.unwrap();

        UserRepository::create(&store, &tx_ctx, &user("carol")).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.user_count(), 0);
        assert_eq!(store.stats().rollbacks, 1);
    }

    #[tokio::test]
    async fn test_failed_commit_discards_writes() {
        let store = MemoryStore::new();
        store.fail_commit(true);
        let (tx, tx_ctx) = store.begin(&ExecutionContext::create()).await.unwrap();

        UserRepository::create(&store, &tx_ctx, &user("dave")).await.unwrap();
        assert!(tx.commit().await.is_err());

        assert_eq!(store.user_count(), 0);
        let stats = store.stats();
        assert_eq!(stats.commits, 0);
        assert_eq!(stats.rollbacks, 1);
    }

    #[tokio::test]
    async fn test_foreign_transaction_is_rejected() {
        let store = MemoryStore::new();
        let other = MemoryStore::new();
        let (tx, tx_ctx) = other.begin(&ExecutionContext::create()).await.unwrap();

        let err = store.find_by_username(&tx_ctx, "x").await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignTransaction));

        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_user_returns_false() {
        let store = MemoryStore::new();
        let updated = store
            .update(&ExecutionContext::create(), &user("ghost"))
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_blogs_are_scoped_and_sorted() {
        let store = MemoryStore::new();
        let ctx = ExecutionContext::create();
        let alice = Principal::new(Uuid::new_v4(), "alice");
        let bob = Principal::new(Uuid::new_v4(), "bob");

        let mut first = Blog::new(&alice, "first");
        first.created_at -= chrono::Duration::seconds(10);
        let second = Blog::new(&alice, "second");
        let other = Blog::new(&bob, "not mine");

        for blog in [&first, &second, &other] {
            BlogRepository::create(&store, &ctx, blog).await.unwrap();
        }

        let blogs = store.find_all(&ctx, alice.user_id).await.unwrap();
        let contents: Vec<_> = blogs.iter().map(|b| b.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "first"]);
    }
}
