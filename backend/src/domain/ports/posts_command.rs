//! Driving port for post mutations.

use async_trait::async_trait;

use crate::domain::{AccountId, Error, PostChanges, PostDraft, PostId, PostView};

/// Owner-scoped post mutations.
///
/// `update` and `delete` report `not_found` when the post does not exist and
/// `forbidden` when it belongs to someone else.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostsCommand: Send + Sync {
    async fn create(&self, owner_id: AccountId, draft: PostDraft) -> Result<PostView, Error>;

    async fn update(
        &self,
        actor: AccountId,
        id: PostId,
        changes: PostChanges,
    ) -> Result<PostView, Error>;

    async fn delete(&self, actor: AccountId, id: PostId) -> Result<(), Error>;
}
