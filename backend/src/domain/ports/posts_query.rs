//! Driving port for post reads.

use async_trait::async_trait;

use crate::domain::{AccountId, Error, PageRequest, PostId, PostView};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostsQuery: Send + Sync {
    /// Fetch one post; missing posts are `not_found`.
    async fn get(&self, id: PostId) -> Result<PostView, Error>;

    /// Page through posts, newest first.
    async fn list(&self, page: PageRequest) -> Result<Vec<PostView>, Error>;

    /// Posts owned by `owner_id`, newest first. Unknown owners yield an empty
    /// list.
    async fn list_by_owner(&self, owner_id: AccountId) -> Result<Vec<PostView>, Error>;
}
