//! List Blogs Use Case

use std::sync::Arc;

use crate::usecase::{ExecutionContext, UseCaseResult};
use crate::{Blog, BlogRepository};

pub struct ListBlogsUseCase {
    blog_repo: Arc<dyn BlogRepository>,
}

impl ListBlogsUseCase {
    pub fn new(blog_repo: Arc<dyn BlogRepository>) -> Self {
        Self { blog_repo }
    }

    /// The caller's blogs, newest first.
    pub async fn execute(&self, ctx: &ExecutionContext) -> UseCaseResult<Vec<Blog>> {
        let principal = ctx.require_principal()?;

        let mut blogs = self.blog_repo.find_all(ctx, principal.user_id).await?;
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(blogs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use crate::usecase::Principal;

    #[tokio::test]
    async fn test_lists_only_callers_blogs_newest_first() {
        let f = Fixture::new();
        let alice = f.seed_user("alice", "password-1").await;
        let bob = f.seed_user("bob", "password-2").await;
        let ctx = ExecutionContext::create();

        let alice_principal = Principal::new(alice.id, "alice");
        let mut old = Blog::new(&alice_principal, "old");
        old.created_at -= chrono::Duration::hours(1);
        let new = Blog::new(&alice_principal, "new");
        let other = Blog::new(&Principal::new(bob.id, "bob"), "bob's");
        for blog in [&old, &new, &other] {
            f.store.create(&ctx, blog).await.unwrap();
        }

        let blogs = ListBlogsUseCase::new(f.store.clone())
            .execute(&f.context_for(&alice))
            .await
            .unwrap();

        assert_eq!(blogs, vec![new, old]);
        assert_eq!(f.store.stats().begins, 0);
    }

    #[tokio::test]
    async fn test_requires_principal() {
        let f = Fixture::new();
        let err = ListBlogsUseCase::new(f.store.clone())
            .execute(&ExecutionContext::create())
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 401);
    }
}
