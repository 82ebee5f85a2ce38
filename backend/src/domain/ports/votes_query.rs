//! Driving port for vote counts.

use async_trait::async_trait;

use crate::domain::{Error, PostId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VotesQuery: Send + Sync {
    /// Live ballot count for a post; missing posts are `not_found`.
    async fn count(&self, post_id: PostId) -> Result<i64, Error>;
}
