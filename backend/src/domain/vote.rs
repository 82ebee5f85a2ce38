//! Ballots and vote intents.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, PostId};

/// Raised when a vote direction is neither `0` nor `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Vote direction must be 0 or 1")]
pub struct InvalidVoteDirection {
    pub received: i64,
}

/// What the actor wants to happen to their ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    /// `dir = 1`: cast a ballot.
    Cast,
    /// `dir = 0`: withdraw an existing ballot.
    Retract,
}

impl TryFrom<i64> for VoteDirection {
    type Error = InvalidVoteDirection;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Self::Cast),
            0 => Ok(Self::Retract),
            received => Err(InvalidVoteDirection { received }),
        }
    }
}

/// Validated vote request issued by an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteRequest {
    pub post_id: PostId,
    pub direction: VoteDirection,
}

impl VoteRequest {
    pub fn try_from_parts(post_id: i64, dir: i64) -> Result<Self, InvalidVoteDirection> {
        Ok(Self {
            post_id: PostId::new(post_id),
            direction: VoteDirection::try_from(dir)?,
        })
    }
}

/// Whether the actor holds a ballot on the post after a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotState {
    Voted,
    NoVote,
}

/// Result of a successful vote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub post_id: PostId,
    pub state: BallotState,
    /// Ballot count on the post after the change.
    pub votes: i64,
}

/// A recorded ballot. At most one exists per `(account_id, post_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub post_id: PostId,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
}

/// Ballot mutation handed to the ballot repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotChange {
    Cast { post_id: PostId, account_id: AccountId },
    Retract { post_id: PostId, account_id: AccountId },
}

impl BallotChange {
    pub fn post_id(self) -> PostId {
        match self {
            Self::Cast { post_id, .. } | Self::Retract { post_id, .. } => post_id,
        }
    }
}

/// How the denormalised post vote count is kept in step with ballots.
///
/// Configuration spells the modes in lowercase: `transactional` or
/// `sequential`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TallyMode {
    /// Ballot mutation, recount, and count update commit together while the
    /// post row is locked.
    #[default]
    Transactional,
    /// Ballot mutation, recount, and count update run as separate calls.
    /// Concurrent votes on one post may briefly leave a stale count that the
    /// next vote repairs.
    Sequential,
}

/// Raised when a tally mode name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tally mode '{0}'; expected transactional or sequential")]
pub struct UnknownTallyMode(pub String);

impl FromStr for TallyMode {
    type Err = UnknownTallyMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "transactional" => Ok(Self::Transactional),
            "sequential" => Ok(Self::Sequential),
            _ => Err(UnknownTallyMode(raw.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, VoteDirection::Cast)]
    #[case(0, VoteDirection::Retract)]
    fn parses_known_directions(#[case] raw: i64, #[case] expected: VoteDirection) {
        assert_eq!(VoteDirection::try_from(raw), Ok(expected));
    }

    #[rstest]
    #[case(-1)]
    #[case(2)]
    #[case(i64::MAX)]
    fn rejects_other_directions(#[case] raw: i64) {
        let err = VoteDirection::try_from(raw).expect_err("direction must be rejected");
        assert_eq!(err.received, raw);
        assert_eq!(err.to_string(), "Vote direction must be 0 or 1");
    }

    #[rstest]
    #[case("transactional", TallyMode::Transactional)]
    #[case(" Sequential ", TallyMode::Sequential)]
    fn tally_mode_parses_names(#[case] raw: &str, #[case] expected: TallyMode) {
        assert_eq!(raw.parse::<TallyMode>(), Ok(expected));
    }

    #[rstest]
    fn tally_mode_rejects_unknown_names() {
        let err = "eventually".parse::<TallyMode>().expect_err("unknown mode");
        assert_eq!(err, UnknownTallyMode("eventually".to_owned()));
    }

    #[rstest]
    #[case("\"sequential\"", Some(TallyMode::Sequential))]
    #[case("\"transactional\"", Some(TallyMode::Transactional))]
    #[case("\"Eventually\"", None)]
    fn tally_mode_deserialises_lowercase_names(
        #[case] json: &str,
        #[case] expected: Option<TallyMode>,
    ) {
        assert_eq!(serde_json::from_str::<TallyMode>(json).ok(), expected);
    }

    #[rstest]
    fn change_exposes_post() {
        let change = BallotChange::Retract {
            post_id: PostId::new(7),
            account_id: AccountId::new(1),
        };
        assert_eq!(change.post_id(), PostId::new(7));
    }
}
