//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_repository;
mod ballot_repository;
mod login_service;
mod post_repository;
mod posts_command;
mod posts_query;
mod votes_command;
mod votes_query;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{
    AccountRepository, AccountRepositoryError, IdentityField, NewAccount, StoredCredentials,
};
#[cfg(test)]
pub use ballot_repository::MockBallotRepository;
pub use ballot_repository::{BallotRepository, BallotRepositoryError, BallotTally};
#[cfg(test)]
pub use login_service::{MockLoginService, MockRegistrationService, MockTokenAuthenticator};
pub use login_service::{LoginService, RegistrationService, TokenAuthenticator};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostRepository, PostRepositoryError};
#[cfg(test)]
pub use posts_command::MockPostsCommand;
pub use posts_command::PostsCommand;
#[cfg(test)]
pub use posts_query::MockPostsQuery;
pub use posts_query::PostsQuery;
#[cfg(test)]
pub use votes_command::MockVotesCommand;
pub use votes_command::VotesCommand;
#[cfg(test)]
pub use votes_query::MockVotesQuery;
pub use votes_query::VotesQuery;
