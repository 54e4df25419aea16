//! Fixtures for use case tests

use std::sync::Arc;

use crate::auth::{Argon2Config, AuthConfig, AuthService, PasswordPolicy, PasswordService};
use crate::store::{MemoryStore, Replicator};
use crate::usecase::{ExecutionContext, Principal};
use crate::User;

pub(crate) const TEST_SECRET: &str = "unit-test-secret-0123456789abcdef";

pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub replica: MemoryStore,
    pub replicator: Replicator,
    pub passwords: Arc<PasswordService>,
    pub auth: Arc<AuthService>,
}

impl Fixture {
    pub fn new() -> Self {
        let replica = MemoryStore::new();
        Self {
            store: Arc::new(MemoryStore::new()),
            replicator: Replicator::new(Arc::new(replica.clone())),
            replica,
            passwords: Arc::new(
                PasswordService::new(Argon2Config::testing(), PasswordPolicy::lenient()).unwrap(),
            ),
            auth: Arc::new(AuthService::new(AuthConfig {
                secret_key: TEST_SECRET.to_string(),
                ..AuthConfig::default()
            })),
        }
    }

    /// Insert a user directly, bypassing the use cases.
    pub async fn seed_user(&self, username: &str, password: &str) -> User {
        let hash = self.passwords.hash_password(password).unwrap();
        let user = User::new("Seeded User", username, hash);
        crate::UserRepository::create(&*self.store, &ExecutionContext::create(), &user)
            .await
            .unwrap();
        user
    }

    pub fn context_for(&self, user: &User) -> ExecutionContext {
        ExecutionContext::create().authenticated(Principal::new(user.id, user.username.clone()))
    }

    /// Wait for queued replica writes to be applied.
    pub async fn settle_replication(&self) {
        self.replicator.flush().await;
    }
}
