//! Create Blog Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::details;
use crate::store::Replicator;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::{Blog, BlogRepository};

pub const CONTENT_MAX_CHARS: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlogCommand {
    pub content: String,
}

pub struct CreateBlogUseCase {
    unit_of_work: Arc<dyn UnitOfWork>,
    blog_repo: Arc<dyn BlogRepository>,
    replicator: Replicator,
}

impl CreateBlogUseCase {
    pub fn new(
        unit_of_work: Arc<dyn UnitOfWork>,
        blog_repo: Arc<dyn BlogRepository>,
        replicator: Replicator,
    ) -> Self {
        Self {
            unit_of_work,
            blog_repo,
            replicator,
        }
    }

    pub async fn execute(&self, command: CreateBlogCommand, ctx: &ExecutionContext) -> UseCaseResult<Blog> {
        let principal = ctx.require_principal()?;

        // Validation: content is required
        if command.content.trim().is_empty() {
            return Err(UseCaseError::validation("CONTENT_REQUIRED", "Content is required"));
        }

        // Validation: content length
        if command.content.chars().count() > CONTENT_MAX_CHARS {
            return Err(UseCaseError::validation_with_details(
                "CONTENT_TOO_LONG",
                format!("Content must be at most {} characters", CONTENT_MAX_CHARS),
                details! { "max" => CONTENT_MAX_CHARS },
            ));
        }

        let (tx, tx_ctx) = self
            .unit_of_work
            .begin(ctx)
            .await
            .map_err(UseCaseError::from_begin)?;

        let blog = Blog::new(principal, command.content);
        self.blog_repo.create(&tx_ctx, &blog).await?;

        tx.commit().await.map_err(UseCaseError::from_commit)?;
        info!(blog_id = %blog.id, author_id = %blog.author_id, "Blog created");

        self.replicator.replicate_blog(&blog);

        Ok(blog)
    }
}
