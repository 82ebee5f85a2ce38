//! Driving port for casting and retracting votes.

use async_trait::async_trait;

use crate::domain::{AccountId, Error, VoteOutcome, VoteRequest};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VotesCommand: Send + Sync {
    /// Apply `request` on behalf of `actor`.
    ///
    /// Fails with `not_found` for a missing post or a retraction without a
    /// ballot, `forbidden` when voting on one's own post, and `conflict` when
    /// casting a second ballot.
    async fn vote(&self, actor: AccountId, request: VoteRequest) -> Result<VoteOutcome, Error>;
}
