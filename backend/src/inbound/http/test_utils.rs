//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::web;

use crate::domain::ports::{
    MockLoginService, MockPostsCommand, MockPostsQuery, MockRegistrationService,
    MockTokenAuthenticator, MockVotesCommand, MockVotesQuery,
};
use crate::inbound::http::state::HttpState;

/// One mock per port; set expectations, then hand to [`state_data`].
/// Unconfigured mocks panic when called, so every test states what it uses.
#[derive(Default)]
pub struct StatePorts {
    pub registration: MockRegistrationService,
    pub login: MockLoginService,
    pub authenticator: MockTokenAuthenticator,
    pub posts: MockPostsCommand,
    pub posts_query: MockPostsQuery,
    pub votes: MockVotesCommand,
    pub votes_query: MockVotesQuery,
}

pub fn state_data(ports: StatePorts) -> web::Data<HttpState> {
    web::Data::new(HttpState {
        registration: Arc::new(ports.registration),
        login: Arc::new(ports.login),
        authenticator: Arc::new(ports.authenticator),
        posts: Arc::new(ports.posts),
        posts_query: Arc::new(ports.posts_query),
        votes: Arc::new(ports.votes),
        votes_query: Arc::new(ports.votes_query),
    })
}

/// Configure the authenticator to resolve `token` to `account`.
pub fn authenticate_as(ports: &mut StatePorts, token: &'static str, account: crate::domain::Account) {
    ports
        .authenticator
        .expect_authenticate()
        .withf(move |presented| presented == token)
        .returning(move |_| Ok(account.clone()));
}
