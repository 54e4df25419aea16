//! User Entity

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
///
/// `password_hash` is the argon2 PHC string, never the plaintext, and is not
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        // microsecond precision survives every store
        let now = Utc::now().trunc_subsecs(6);
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now().trunc_subsecs(6);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user() {
        let user = User::new("Alice", "alice", "$argon2id$hash");
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("Alice", "alice", "$argon2id$hash");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
