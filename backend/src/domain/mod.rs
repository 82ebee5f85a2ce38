//! Domain primitives, services, and ports.
//!
//! Purpose: define strongly typed entities used by the API and persistence
//! layers, and the services that enforce account, post, and voting rules.
//! Types here never depend on actix or Diesel.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Account, Email, Username, Registration: identity model.
//! - LoginCredentials, AccessToken, CredentialService: authentication.
//! - Post, PostView, PostDraft, PostChanges, PageRequest: content model.
//! - VoteRequest, VoteOutcome, Ballot, TallyMode: voting model.

pub mod account;
pub mod account_service;
pub mod auth;
pub mod credentials;
pub mod error;
pub mod ports;
pub mod post;
pub mod post_service;
pub mod trace_id;
pub mod vote;
pub mod vote_service;

pub use self::account::{
    Account, AccountId, AccountValidationError, Email, PASSWORD_MIN, Registration, USERNAME_MAX,
    USERNAME_MIN, Username,
};
pub use self::account_service::AccountService;
pub use self::auth::{AccessToken, LoginCredentials, LoginValidationError};
pub use self::credentials::{
    CredentialError, CredentialService, DEFAULT_TOKEN_TTL_MINUTES, TokenAlgorithm, TokenError,
    TokenSettings, TokenSettingsError, UnsupportedAlgorithm,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::post::{
    CONTENT_MIN, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, PageRequest, Post, PostChanges, PostContent,
    PostDraft, PostId, PostTitle, PostValidationError, PostView, TITLE_MAX, TITLE_MIN,
};
pub use self::post_service::PostService;
pub use self::trace_id::TraceId;
pub use self::vote::{
    Ballot, BallotChange, BallotState, InvalidVoteDirection, TallyMode, UnknownTallyMode,
    VoteDirection, VoteOutcome, VoteRequest,
};
pub use self::vote_service::VoteService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use upvote::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
