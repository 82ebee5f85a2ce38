//! Builders for HTTP state over Diesel-backed or in-memory repositories.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use upvote::domain::ports::{AccountRepository, BallotRepository, PostRepository};
use upvote::domain::{AccountService, CredentialService, PostService, TallyMode, VoteService};
use upvote::inbound::http::state::HttpState;
use upvote::outbound::memory::InMemoryStore;
use upvote::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselBallotRepository, DieselPostRepository,
};

use super::ServerConfig;

/// Wire the account, post, and vote services over one set of repositories.
fn build_services<A, P, B>(
    accounts: Arc<A>,
    posts: Arc<P>,
    ballots: Arc<B>,
    credentials: Arc<CredentialService>,
    tally_mode: TallyMode,
) -> HttpState
where
    A: AccountRepository + 'static,
    P: PostRepository + 'static,
    B: BallotRepository + 'static,
{
    HttpState::from_services(
        Arc::new(AccountService::new(accounts, credentials)),
        Arc::new(PostService::new(posts.clone())),
        Arc::new(VoteService::with_mode(posts, ballots, tally_mode)),
    )
}

fn build_diesel_state(
    pool: &DbPool,
    credentials: Arc<CredentialService>,
    tally_mode: TallyMode,
) -> HttpState {
    build_services(
        Arc::new(DieselAccountRepository::new(pool.clone())),
        Arc::new(DieselPostRepository::new(pool.clone())),
        Arc::new(DieselBallotRepository::new(pool.clone())),
        credentials,
        tally_mode,
    )
}

/// Repositories over a fresh [`InMemoryStore`].
fn build_memory_state(
    credentials: Arc<CredentialService>,
    tally_mode: TallyMode,
) -> HttpState {
    let store = Arc::new(InMemoryStore::default());
    build_services(store.clone(), store.clone(), store, credentials, tally_mode)
}

/// Build the shared HTTP state, preferring the database when a pool is set.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    build_http_state_with_clock(config, Arc::new(DefaultClock))
}

fn build_http_state_with_clock(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> web::Data<HttpState> {
    let credentials = Arc::new(CredentialService::new(
        config.token_settings.clone(),
        clock,
    ));
    let state = match &config.db_pool {
        Some(pool) => {
            info!(tally_mode = ?config.tally_mode, "using PostgreSQL repositories");
            build_diesel_state(pool, credentials, config.tally_mode)
        }
        None => {
            warn!("no database configured; data is kept in memory and lost on restart");
            build_memory_state(credentials, config.tally_mode)
        }
    };
    web::Data::new(state)
}
