//! Voting rules.
//!
//! Each (account, post) pair moves between *no vote* and *voted*. Casting
//! twice is a conflict, retracting nothing is not found, and nobody votes on
//! their own post. After every accepted change the post's stored vote count
//! is rewritten from the ballot count.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    BallotRepository, BallotRepositoryError, BallotTally, PostRepository, VotesCommand,
    VotesQuery,
};
use crate::domain::post_service::{map_post_error, post_not_found};
use crate::domain::{
    AccountId, BallotChange, BallotState, Error, PostId, PostView, TallyMode, VoteDirection,
    VoteOutcome, VoteRequest,
};

/// Vote service implementing [`VotesCommand`] and [`VotesQuery`].
#[derive(Clone)]
pub struct VoteService<P, B> {
    posts: Arc<P>,
    ballots: Arc<B>,
    mode: TallyMode,
}

impl<P, B> VoteService<P, B> {
    /// Create a service using [`TallyMode::Transactional`].
    pub fn new(posts: Arc<P>, ballots: Arc<B>) -> Self {
        Self::with_mode(posts, ballots, TallyMode::default())
    }

    pub fn with_mode(posts: Arc<P>, ballots: Arc<B>, mode: TallyMode) -> Self {
        Self {
            posts,
            ballots,
            mode,
        }
    }
}

fn self_vote() -> Error {
    Error::forbidden("You cannot vote on your own post").with_details(json!({
        "code": "self_vote",
    }))
}

fn duplicate_vote(actor: AccountId, post_id: PostId) -> Error {
    Error::conflict(format!("User {actor} has already voted on post {post_id}")).with_details(
        json!({
            "code": "duplicate_vote",
        }),
    )
}

fn vote_not_found() -> Error {
    Error::not_found("Vote does not exist").with_details(json!({
        "code": "vote_not_found",
    }))
}

fn map_ballot_error(error: BallotRepositoryError) -> Error {
    match error {
        BallotRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ballot repository unavailable: {message}"))
        }
        BallotRepositoryError::Query { message } => {
            Error::internal(format!("ballot repository error: {message}"))
        }
        BallotRepositoryError::AlreadyExists {
            post_id,
            account_id,
        } => duplicate_vote(account_id, post_id),
        BallotRepositoryError::Missing { .. } => vote_not_found(),
        BallotRepositoryError::PostMissing { post_id } => post_not_found(post_id),
    }
}

impl<P, B> VoteService<P, B>
where
    P: PostRepository,
    B: BallotRepository,
{
    async fn load_post(&self, post_id: PostId) -> Result<PostView, Error> {
        self.posts
            .find_by_id(post_id)
            .await
            .map_err(map_post_error)?
            .ok_or_else(|| post_not_found(post_id))
    }

    /// Mutate the ballot, recount, and store the count as separate calls.
    async fn apply_sequential(&self, change: BallotChange) -> Result<BallotTally, Error> {
        match change {
            BallotChange::Cast {
                post_id,
                account_id,
            } => {
                self.ballots
                    .create(post_id, account_id)
                    .await
                    .map_err(map_ballot_error)?;
            }
            BallotChange::Retract {
                post_id,
                account_id,
            } => {
                let removed = self
                    .ballots
                    .delete(post_id, account_id)
                    .await
                    .map_err(map_ballot_error)?;
                if !removed {
                    return Err(vote_not_found());
                }
            }
        }
        let post_id = change.post_id();
        let votes = self
            .ballots
            .count(post_id)
            .await
            .map_err(map_ballot_error)?;
        self.posts
            .set_vote_count(post_id, votes)
            .await
            .map_err(map_post_error)?;
        Ok(BallotTally { post_id, votes })
    }
}

#[async_trait]
impl<P, B> VotesCommand for VoteService<P, B>
where
    P: PostRepository,
    B: BallotRepository,
{
    async fn vote(&self, actor: AccountId, request: VoteRequest) -> Result<VoteOutcome, Error> {
        let post_id = request.post_id;
        let post = self.load_post(post_id).await?;
        if post.owner_id() == actor {
            debug!(post_id = %post_id, "self vote rejected");
            return Err(self_vote());
        }

        let existing = self
            .ballots
            .find(post_id, actor)
            .await
            .map_err(map_ballot_error)?;

        let (change, state) = match (request.direction, existing) {
            (VoteDirection::Cast, Some(_)) => return Err(duplicate_vote(actor, post_id)),
            (VoteDirection::Retract, None) => return Err(vote_not_found()),
            (VoteDirection::Cast, None) => (
                BallotChange::Cast {
                    post_id,
                    account_id: actor,
                },
                BallotState::Voted,
            ),
            (VoteDirection::Retract, Some(_)) => (
                BallotChange::Retract {
                    post_id,
                    account_id: actor,
                },
                BallotState::NoVote,
            ),
        };

        let tally = match self.mode {
            TallyMode::Transactional => self
                .ballots
                .apply(change)
                .await
                .map_err(map_ballot_error)?,
            TallyMode::Sequential => self.apply_sequential(change).await?,
        };

        info!(
            post_id = %post_id,
            account_id = %actor,
            votes = tally.votes,
            "vote applied"
        );
        Ok(VoteOutcome {
            post_id,
            state,
            votes: tally.votes,
        })
    }
}

#[async_trait]
impl<P, B> VotesQuery for VoteService<P, B>
where
    P: PostRepository,
    B: BallotRepository,
{
    async fn count(&self, post_id: PostId) -> Result<i64, Error> {
        self.load_post(post_id).await?;
        self.ballots
            .count(post_id)
            .await
            .map_err(map_ballot_error)
    }
}

#[cfg(test)]
#[path = "vote_service_tests.rs"]
mod tests;
