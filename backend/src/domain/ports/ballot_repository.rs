//! Driven port for ballot persistence.

use async_trait::async_trait;

use crate::domain::{AccountId, Ballot, BallotChange, PostId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ballot repository adapters.
    pub enum BallotRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "ballot repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "ballot repository query failed: {message}",
        /// A ballot for this account and post already exists.
        AlreadyExists { post_id: PostId, account_id: AccountId } =>
            "account {account_id} already holds a ballot on post {post_id}",
        /// A retraction found no ballot to remove.
        Missing { post_id: PostId, account_id: AccountId } =>
            "account {account_id} holds no ballot on post {post_id}",
        /// The post disappeared before the change could be applied.
        PostMissing { post_id: PostId } => "post {post_id} does not exist",
    }
}

/// Ballot count written back to the post after [`BallotRepository::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallotTally {
    pub post_id: PostId,
    pub votes: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BallotRepository: Send + Sync {
    /// Record a ballot. Fails with `AlreadyExists` on the unique constraint.
    async fn create(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<Ballot, BallotRepositoryError>;

    async fn find(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<Option<Ballot>, BallotRepositoryError>;

    /// Remove a ballot, returning whether one existed.
    async fn delete(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<bool, BallotRepositoryError>;

    async fn count(&self, post_id: PostId) -> Result<i64, BallotRepositoryError>;

    /// Apply `change`, recount, and store the count on the post as one unit.
    ///
    /// Adapters lock the post for the duration so concurrent changes to the
    /// same post serialise and the stored count always matches the ballots.
    async fn apply(&self, change: BallotChange) -> Result<BallotTally, BallotRepositoryError>;
}
