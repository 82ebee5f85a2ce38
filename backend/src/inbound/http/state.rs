//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    LoginService, PostsCommand, PostsQuery, RegistrationService, TokenAuthenticator,
    VotesCommand, VotesQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub registration: Arc<dyn RegistrationService>,
    pub login: Arc<dyn LoginService>,
    pub authenticator: Arc<dyn TokenAuthenticator>,
    pub posts: Arc<dyn PostsCommand>,
    pub posts_query: Arc<dyn PostsQuery>,
    pub votes: Arc<dyn VotesCommand>,
    pub votes_query: Arc<dyn VotesQuery>,
}

impl HttpState {
    /// Build state from one service per feature area, each serving both the
    /// command and query side of its ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use upvote::domain::{
    ///     AccountService, CredentialService, PostService, TokenAlgorithm, TokenSettings,
    ///     VoteService,
    /// };
    /// use upvote::inbound::http::state::HttpState;
    /// use upvote::outbound::memory::InMemoryStore;
    ///
    /// let store = Arc::new(InMemoryStore::default());
    /// let settings =
    ///     TokenSettings::new(vec![7; 32], TokenAlgorithm::Hs256, 30).expect("valid settings");
    /// let credentials = Arc::new(CredentialService::new(settings, Arc::new(DefaultClock)));
    /// let state = HttpState::from_services(
    ///     Arc::new(AccountService::new(store.clone(), credentials)),
    ///     Arc::new(PostService::new(store.clone())),
    ///     Arc::new(VoteService::new(store.clone(), store)),
    /// );
    /// let _login = state.login.clone();
    /// ```
    pub fn from_services<A, P, V>(accounts: Arc<A>, posts: Arc<P>, votes: Arc<V>) -> Self
    where
        A: RegistrationService + LoginService + TokenAuthenticator + 'static,
        P: PostsCommand + PostsQuery + 'static,
        V: VotesCommand + VotesQuery + 'static,
    {
        Self {
            registration: accounts.clone(),
            login: accounts.clone(),
            authenticator: accounts,
            posts: posts.clone(),
            posts_query: posts,
            votes: votes.clone(),
            votes_query: votes,
        }
    }
}
