//! Driven port for account persistence.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Account, AccountId, Email, Username};

use super::define_port_error;

/// Identity column that collided with an existing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    Username,
}

impl IdentityField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Username => "username",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

define_port_error! {
    /// Errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
        /// Insert violated the unique email or username constraint.
        DuplicateIdentity { field: IdentityField } => "account {field} already exists",
    }
}

/// Row to insert for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: Email,
    pub username: Username,
    pub password_hash: String,
}

/// Account together with its stored password hash. Only login sees this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub account: Account,
    pub password_hash: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account and return it with its assigned id.
    async fn create(&self, account: &NewAccount) -> Result<Account, AccountRepositoryError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError>;

    async fn find_by_email(&self, email: &Email)
    -> Result<Option<Account>, AccountRepositoryError>;

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Load the account and password hash for `username`, if registered.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, AccountRepositoryError>;
}
