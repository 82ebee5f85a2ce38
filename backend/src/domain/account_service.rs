//! Account registration, login, and bearer-token resolution.
//!
//! Password hashing and verification are CPU-heavy and run on the blocking
//! pool so request workers keep serving while Argon2 grinds.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, IdentityField, LoginService, NewAccount,
    RegistrationService, TokenAuthenticator,
};
use crate::domain::{
    AccessToken, Account, CredentialError, CredentialService, Error, LoginCredentials,
    Registration,
};

pub(crate) const INVALID_LOGIN_MESSAGE: &str = "Incorrect username or password";
pub(crate) const INVALID_TOKEN_MESSAGE: &str = "Could not validate credentials";

/// Account use-cases backed by an [`AccountRepository`].
#[derive(Clone)]
pub struct AccountService<A> {
    accounts: Arc<A>,
    credentials: Arc<CredentialService>,
}

impl<A> AccountService<A> {
    pub fn new(accounts: Arc<A>, credentials: Arc<CredentialService>) -> Self {
        Self {
            accounts,
            credentials,
        }
    }
}

fn map_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account repository unavailable: {message}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::internal(format!("account repository error: {message}"))
        }
        AccountRepositoryError::DuplicateIdentity { field } => duplicate_identity(field),
    }
}

fn duplicate_identity(field: IdentityField) -> Error {
    let message = match field {
        IdentityField::Email => "Email already registered",
        IdentityField::Username => "Username already taken",
    };
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": "duplicate_identity",
    }))
}

fn map_credential_error(error: CredentialError) -> Error {
    Error::internal(format!("credential processing failed: {error}"))
}

fn invalid_token() -> Error {
    Error::unauthorized(INVALID_TOKEN_MESSAGE)
}

impl<A> AccountService<A>
where
    A: AccountRepository,
{
    async fn hash_password(&self, password: Zeroizing<String>) -> Result<String, Error> {
        let credentials = Arc::clone(&self.credentials);
        tokio::task::spawn_blocking(move || credentials.hash_password(password.as_str()))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(map_credential_error)
    }

    async fn verify_password(
        &self,
        password: Zeroizing<String>,
        stored_hash: String,
    ) -> Result<bool, Error> {
        let credentials = Arc::clone(&self.credentials);
        tokio::task::spawn_blocking(move || {
            credentials.verify_password(password.as_str(), &stored_hash)
        })
        .await
        .map_err(|err| Error::internal(format!("password verification task failed: {err}")))
    }
}

#[async_trait]
impl<A> RegistrationService for AccountService<A>
where
    A: AccountRepository,
{
    async fn register(&self, registration: Registration) -> Result<Account, Error> {
        if self
            .accounts
            .find_by_email(registration.email())
            .await
            .map_err(map_repository_error)?
            .is_some()
        {
            return Err(duplicate_identity(IdentityField::Email));
        }
        if self
            .accounts
            .find_by_username(registration.username())
            .await
            .map_err(map_repository_error)?
            .is_some()
        {
            return Err(duplicate_identity(IdentityField::Username));
        }

        let password_hash = self
            .hash_password(Zeroizing::new(registration.password().to_owned()))
            .await?;
        let account = self
            .accounts
            .create(&NewAccount {
                email: registration.email().clone(),
                username: registration.username().clone(),
                password_hash,
            })
            .await
            .map_err(map_repository_error)?;

        info!(account_id = %account.id, "account registered");
        Ok(account)
    }
}

#[async_trait]
impl<A> LoginService for AccountService<A>
where
    A: AccountRepository,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<AccessToken, Error> {
        let Some(stored) = self
            .accounts
            .find_credentials(credentials.username())
            .await
            .map_err(map_repository_error)?
        else {
            debug!("login rejected: unknown username");
            return Err(Error::unauthorized(INVALID_LOGIN_MESSAGE));
        };

        let verified = self
            .verify_password(
                Zeroizing::new(credentials.password().to_owned()),
                stored.password_hash,
            )
            .await?;
        if !verified {
            debug!(account_id = %stored.account.id, "login rejected: wrong password");
            return Err(Error::unauthorized(INVALID_LOGIN_MESSAGE));
        }

        self.credentials
            .issue(stored.account.id)
            .map_err(map_credential_error)
    }
}

#[async_trait]
impl<A> TokenAuthenticator for AccountService<A>
where
    A: AccountRepository,
{
    async fn authenticate(&self, token: &str) -> Result<Account, Error> {
        let account_id = self.credentials.verify(token).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            invalid_token()
        })?;
        self.accounts
            .find_by_id(account_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(invalid_token)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
