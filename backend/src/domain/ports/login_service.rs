//! Driving ports for the account use-cases.
//!
//! Inbound adapters call these to register, log in, and resolve a bearer
//! token to an account without importing any infrastructure, so handler tests
//! can substitute a mock.

use async_trait::async_trait;

use crate::domain::{AccessToken, Account, Error, LoginCredentials, Registration};

/// Create new accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Register a new account; duplicate email or username is rejected.
    async fn register(&self, registration: Registration) -> Result<Account, Error>;
}

/// Exchange credentials for an access token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Unknown usernames and wrong passwords fail identically.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AccessToken, Error>;
}

/// Resolve a presented bearer token to the account it names.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenAuthenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Account, Error>;
}
