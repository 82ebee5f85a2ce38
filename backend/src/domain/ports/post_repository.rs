//! Driven port for post persistence.
//!
//! Reads return [`PostView`] rows so adapters can join the owner's username
//! in the same query. Mutations are scoped by owner: an update or delete that
//! names the wrong owner touches nothing.

use async_trait::async_trait;

use crate::domain::{AccountId, PageRequest, PostChanges, PostDraft, PostId, PostView};

use super::define_port_error;

define_port_error! {
    /// Errors raised by post repository adapters.
    pub enum PostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post owned by `owner_id` with a zero vote count.
    async fn create(
        &self,
        owner_id: AccountId,
        draft: &PostDraft,
    ) -> Result<PostView, PostRepositoryError>;

    async fn find_by_id(&self, id: PostId) -> Result<Option<PostView>, PostRepositoryError>;

    /// Page through all posts, newest first.
    async fn list(&self, page: PageRequest) -> Result<Vec<PostView>, PostRepositoryError>;

    /// Every post owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: AccountId)
    -> Result<Vec<PostView>, PostRepositoryError>;

    /// Apply `changes` when the post exists and belongs to `owner_id`.
    ///
    /// Returns `None` when no row matched.
    async fn update(
        &self,
        id: PostId,
        owner_id: AccountId,
        changes: &PostChanges,
    ) -> Result<Option<PostView>, PostRepositoryError>;

    /// Delete the post when it belongs to `owner_id`; ballots cascade.
    async fn delete(&self, id: PostId, owner_id: AccountId) -> Result<bool, PostRepositoryError>;

    /// Overwrite the denormalised vote count.
    async fn set_vote_count(&self, id: PostId, votes: i64) -> Result<(), PostRepositoryError>;
}
