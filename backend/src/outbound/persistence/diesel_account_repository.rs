//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.
//!
//! Email and username uniqueness is enforced by the `accounts_email_key` and
//! `accounts_username_key` constraints; violations surface as
//! `DuplicateIdentity` so concurrent registrations cannot both succeed.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, IdentityField, NewAccount, StoredCredentials,
};
use crate::domain::{Account, AccountId, Email, Username};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{AccountRow, NewAccountRow};
use super::pool::{DbPool, PoolError};
use super::schema::accounts;

const EMAIL_CONSTRAINT: &str = "accounts_email_key";
const USERNAME_CONSTRAINT: &str = "accounts_username_key";

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountRepositoryError {
    AccountRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> AccountRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => AccountRepositoryError::connection(message),
        DieselFailure::UniqueViolation { constraint } => match constraint.as_deref() {
            Some(EMAIL_CONSTRAINT) => AccountRepositoryError::duplicate_identity(IdentityField::Email),
            Some(USERNAME_CONSTRAINT) => {
                AccountRepositoryError::duplicate_identity(IdentityField::Username)
            }
            _ => AccountRepositoryError::query("unique constraint violated"),
        },
        DieselFailure::ForeignKeyViolation { .. } => {
            AccountRepositoryError::query("foreign key constraint violated")
        }
        DieselFailure::Query(message) => AccountRepositoryError::query(message),
    }
}

/// Convert a stored row, re-validating the identity columns.
fn row_to_account(row: AccountRow) -> Result<(Account, String), AccountRepositoryError> {
    let AccountRow {
        id,
        email,
        username,
        password_hash,
        created_at,
    } = row;
    let email = Email::new(&email)
        .map_err(|err| AccountRepositoryError::query(format!("stored email invalid: {err}")))?;
    let username = Username::new(&username)
        .map_err(|err| AccountRepositoryError::query(format!("stored username invalid: {err}")))?;
    let account = Account {
        id: AccountId::new(id),
        email,
        username,
        created_at,
    };
    Ok((account, password_hash))
}

fn row_to_public_account(row: AccountRow) -> Result<Account, AccountRepositoryError> {
    row_to_account(row).map(|(account, _)| account)
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn create(&self, account: &NewAccount) -> Result<Account, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewAccountRow {
            email: account.email.as_ref(),
            username: account.username.as_ref(),
            password_hash: &account.password_hash,
        };

        let row = diesel::insert_into(accounts::table)
            .values(&new_row)
            .returning(AccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_public_account(row)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        accounts::table
            .filter(accounts::id.eq(id.get()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_public_account)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        accounts::table
            .filter(accounts::email.eq(email.as_ref()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_public_account)
            .transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        accounts::table
            .filter(accounts::username.eq(username.as_ref()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_public_account)
            .transpose()
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = accounts::table
            .filter(accounts::username.eq(username.trim()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let (account, password_hash) = row_to_account(row)?;
        Ok(Some(StoredCredentials {
            account,
            password_hash,
        }))
    }
}
