//! Post use-cases: creation, reads, and owner-scoped mutation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{PostRepository, PostRepositoryError, PostsCommand, PostsQuery};
use crate::domain::{AccountId, Error, PageRequest, PostChanges, PostDraft, PostId, PostView};

pub(crate) const NOT_OWNER_MESSAGE: &str = "Not authorized to perform requested action";

/// Post service implementing [`PostsCommand`] and [`PostsQuery`].
#[derive(Clone)]
pub struct PostService<P> {
    posts: Arc<P>,
}

impl<P> PostService<P> {
    pub fn new(posts: Arc<P>) -> Self {
        Self { posts }
    }
}

pub(crate) fn map_post_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        PostRepositoryError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
    }
}

pub(crate) fn post_not_found(id: PostId) -> Error {
    Error::not_found(format!("Post with id: {id} was not found"))
}

impl<P> PostService<P>
where
    P: PostRepository,
{
    /// Load the post and confirm `actor` owns it.
    async fn owned_post(&self, actor: AccountId, id: PostId) -> Result<PostView, Error> {
        let post = self
            .posts
            .find_by_id(id)
            .await
            .map_err(map_post_error)?
            .ok_or_else(|| post_not_found(id))?;
        if post.owner_id() != actor {
            return Err(Error::forbidden(NOT_OWNER_MESSAGE));
        }
        Ok(post)
    }
}

#[async_trait]
impl<P> PostsCommand for PostService<P>
where
    P: PostRepository,
{
    async fn create(&self, owner_id: AccountId, draft: PostDraft) -> Result<PostView, Error> {
        let post = self
            .posts
            .create(owner_id, &draft)
            .await
            .map_err(map_post_error)?;
        info!(post_id = %post.id(), owner_id = %owner_id, "post created");
        Ok(post)
    }

    async fn update(
        &self,
        actor: AccountId,
        id: PostId,
        changes: PostChanges,
    ) -> Result<PostView, Error> {
        let current = self.owned_post(actor, id).await?;
        if changes.is_empty() {
            return Ok(current);
        }
        // The row may vanish between the ownership check and the write.
        self.posts
            .update(id, actor, &changes)
            .await
            .map_err(map_post_error)?
            .ok_or_else(|| post_not_found(id))
    }

    async fn delete(&self, actor: AccountId, id: PostId) -> Result<(), Error> {
        self.owned_post(actor, id).await?;
        let deleted = self
            .posts
            .delete(id, actor)
            .await
            .map_err(map_post_error)?;
        if !deleted {
            return Err(post_not_found(id));
        }
        info!(post_id = %id, "post deleted");
        Ok(())
    }
}

#[async_trait]
impl<P> PostsQuery for PostService<P>
where
    P: PostRepository,
{
    async fn get(&self, id: PostId) -> Result<PostView, Error> {
        self.posts
            .find_by_id(id)
            .await
            .map_err(map_post_error)?
            .ok_or_else(|| post_not_found(id))
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<PostView>, Error> {
        self.posts.list(page).await.map_err(map_post_error)
    }

    async fn list_by_owner(&self, owner_id: AccountId) -> Result<Vec<PostView>, Error> {
        self.posts
            .list_by_owner(owner_id)
            .await
            .map_err(map_post_error)
    }
}

#[cfg(test)]
#[path = "post_service_tests.rs"]
mod tests;
