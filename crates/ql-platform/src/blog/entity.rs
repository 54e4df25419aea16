//! Blog Entity

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::usecase::Principal;

/// A blog post written by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Author's username at the time of writing
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Blog {
    pub fn new(author: &Principal, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id: author.user_id,
            username: author.username.clone(),
            content: content.into(),
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}
