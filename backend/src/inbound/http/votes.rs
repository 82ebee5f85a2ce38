//! Vote API handlers.
//!
//! ```text
//! POST /vote/               {"post_id":7,"dir":1}   cast
//! POST /vote/               {"post_id":7,"dir":0}   retract
//! GET  /vote/{post_id}/count
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{BallotState, Error, InvalidVoteDirection, PostId, VoteOutcome, VoteRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::CurrentAccount;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Body for `POST /vote/`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct VoteBody {
    #[schema(example = 7)]
    pub post_id: i64,
    /// `1` casts a vote, `0` withdraws it.
    #[schema(example = 1)]
    pub dir: i64,
}

/// Ballot state reported back to the voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BallotStateResponse {
    Voted,
    NoVote,
}

impl From<BallotState> for BallotStateResponse {
    fn from(state: BallotState) -> Self {
        match state {
            BallotState::Voted => Self::Voted,
            BallotState::NoVote => Self::NoVote,
        }
    }
}

/// Outcome of `POST /vote/`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct VoteResponse {
    #[schema(example = "Successfully added vote")]
    pub message: String,
    pub post_id: i64,
    pub state: BallotStateResponse,
    /// Vote count on the post after the change.
    pub votes: i64,
}

impl From<VoteOutcome> for VoteResponse {
    fn from(outcome: VoteOutcome) -> Self {
        let message = match outcome.state {
            BallotState::Voted => "Successfully added vote",
            BallotState::NoVote => "Successfully deleted vote",
        };
        Self {
            message: message.to_owned(),
            post_id: outcome.post_id.get(),
            state: outcome.state.into(),
            votes: outcome.votes,
        }
    }
}

fn map_direction_error(err: InvalidVoteDirection) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": "dir",
        "value": err.received,
        "code": "invalid_direction",
    }))
}

/// Cast or withdraw the caller's vote on a post.
#[utoipa::path(
    post,
    path = "/vote/",
    request_body = VoteBody,
    responses(
        (status = 201, description = "Vote recorded or withdrawn", body = VoteResponse),
        (status = 400, description = "Direction is not 0 or 1", body = ErrorSchema),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema),
        (status = 403, description = "Voting on one's own post", body = ErrorSchema),
        (status = 404, description = "No such post, or no vote to withdraw", body = ErrorSchema),
        (status = 409, description = "Already voted on this post", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "vote"
)]
#[post("/")]
pub async fn vote(
    state: web::Data<HttpState>,
    current: CurrentAccount,
    payload: web::Json<VoteBody>,
) -> ApiResult<HttpResponse> {
    let VoteBody { post_id, dir } = payload.into_inner();
    let request = VoteRequest::try_from_parts(post_id, dir).map_err(map_direction_error)?;
    let outcome = state.votes.vote(current.0.id, request).await?;
    Ok(HttpResponse::Created().json(VoteResponse::from(outcome)))
}

/// Number of votes currently held by a post.
#[utoipa::path(
    get,
    path = "/vote/{post_id}/count",
    params(("post_id" = i64, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Vote count", body = i64),
        (status = 404, description = "No such post", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "voteCount",
    security([])
)]
#[get("/{post_id}/count")]
pub async fn vote_count(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<i64>> {
    let votes = state
        .votes_query
        .count(PostId::new(path.into_inner()))
        .await?;
    Ok(web::Json(votes))
}
