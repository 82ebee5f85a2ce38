//! PostgreSQL-backed `BallotRepository` implementation using Diesel ORM.
//!
//! [`BallotRepository::apply`] runs in one transaction that first takes a
//! `FOR UPDATE` lock on the post row. Concurrent ballot changes on the same
//! post therefore serialise, and `posts.votes` is written from a fresh
//! `COUNT(*)` before the lock is released.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{BallotRepository, BallotRepositoryError, BallotTally};
use crate::domain::{AccountId, Ballot, BallotChange, PostId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{BallotRow, NewBallotRow};
use super::pool::{DbPool, PoolError};
use super::schema::{ballots, posts};

const POST_FOREIGN_KEY: &str = "ballots_post_id_fkey";

/// Diesel-backed implementation of the `BallotRepository` port.
#[derive(Clone)]
pub struct DieselBallotRepository {
    pool: DbPool,
}

impl DieselBallotRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BallotRepositoryError {
    BallotRepositoryError::connection(pool_error_message(error))
}

/// Map Diesel errors raised while touching the ballot for `(post_id, account_id)`.
fn map_diesel_error(
    error: diesel::result::Error,
    post_id: PostId,
    account_id: AccountId,
) -> BallotRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => BallotRepositoryError::connection(message),
        DieselFailure::Query(message) => BallotRepositoryError::query(message),
        DieselFailure::UniqueViolation { .. } => {
            BallotRepositoryError::already_exists(post_id, account_id)
        }
        DieselFailure::ForeignKeyViolation { constraint }
            if constraint.as_deref() == Some(POST_FOREIGN_KEY) =>
        {
            BallotRepositoryError::post_missing(post_id)
        }
        DieselFailure::ForeignKeyViolation { .. } => {
            BallotRepositoryError::query("foreign key constraint violated")
        }
    }
}

fn row_to_ballot(row: BallotRow) -> Ballot {
    Ballot {
        post_id: PostId::new(row.post_id),
        account_id: AccountId::new(row.account_id),
        created_at: row.created_at,
    }
}

/// Failure inside the `apply` transaction; any variant rolls it back.
#[derive(Debug)]
enum ApplyError {
    Diesel(diesel::result::Error),
    AlreadyExists,
    Missing,
    PostMissing,
}

impl From<diesel::result::Error> for ApplyError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

async fn count_ballots(
    conn: &mut AsyncPgConnection,
    post_id: i64,
) -> Result<i64, diesel::result::Error> {
    ballots::table
        .filter(ballots::post_id.eq(post_id))
        .count()
        .get_result(conn)
        .await
}

/// Mutate the ballot, recount, and store the count while the post is locked.
async fn apply_locked(
    conn: &mut AsyncPgConnection,
    change: BallotChange,
) -> Result<i64, ApplyError> {
    let post_id = change.post_id().get();
    let locked = posts::table
        .filter(posts::id.eq(post_id))
        .select(posts::id)
        .for_update()
        .first::<i64>(conn)
        .await
        .optional()?;
    if locked.is_none() {
        return Err(ApplyError::PostMissing);
    }

    match change {
        BallotChange::Cast { account_id, .. } => {
            let inserted = diesel::insert_into(ballots::table)
                .values(&NewBallotRow {
                    account_id: account_id.get(),
                    post_id,
                })
                .on_conflict((ballots::account_id, ballots::post_id))
                .do_nothing()
                .execute(conn)
                .await?;
            if inserted == 0 {
                return Err(ApplyError::AlreadyExists);
            }
        }
        BallotChange::Retract { account_id, .. } => {
            let deleted = diesel::delete(
                ballots::table
                    .filter(ballots::post_id.eq(post_id))
                    .filter(ballots::account_id.eq(account_id.get())),
            )
            .execute(conn)
            .await?;
            if deleted == 0 {
                return Err(ApplyError::Missing);
            }
        }
    }

    let votes = count_ballots(conn, post_id).await?;
    diesel::update(posts::table.filter(posts::id.eq(post_id)))
        .set(posts::votes.eq(votes))
        .execute(conn)
        .await?;
    Ok(votes)
}

fn map_apply_error(error: ApplyError, change: BallotChange) -> BallotRepositoryError {
    let (post_id, account_id) = match change {
        BallotChange::Cast {
            post_id,
            account_id,
        }
        | BallotChange::Retract {
            post_id,
            account_id,
        } => (post_id, account_id),
    };
    match error {
        ApplyError::Diesel(error) => map_diesel_error(error, post_id, account_id),
        ApplyError::AlreadyExists => BallotRepositoryError::already_exists(post_id, account_id),
        ApplyError::Missing => BallotRepositoryError::missing(post_id, account_id),
        ApplyError::PostMissing => BallotRepositoryError::post_missing(post_id),
    }
}

#[async_trait]
impl BallotRepository for DieselBallotRepository {
    async fn create(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<Ballot, BallotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(ballots::table)
            .values(&NewBallotRow {
                account_id: account_id.get(),
                post_id: post_id.get(),
            })
            .returning(BallotRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, post_id, account_id))?;
        Ok(row_to_ballot(row))
    }

    async fn find(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<Option<Ballot>, BallotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = ballots::table
            .filter(ballots::post_id.eq(post_id.get()))
            .filter(ballots::account_id.eq(account_id.get()))
            .select(BallotRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, post_id, account_id))?;
        Ok(row.map(row_to_ballot))
    }

    async fn delete(
        &self,
        post_id: PostId,
        account_id: AccountId,
    ) -> Result<bool, BallotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            ballots::table
                .filter(ballots::post_id.eq(post_id.get()))
                .filter(ballots::account_id.eq(account_id.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, post_id, account_id))?;
        Ok(deleted > 0)
    }

    async fn count(&self, post_id: PostId) -> Result<i64, BallotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        count_ballots(&mut conn, post_id.get())
            .await
            .map_err(|err| match classify_diesel_error(err) {
                DieselFailure::Connection(message) => BallotRepositoryError::connection(message),
                _ => BallotRepositoryError::query("failed to count ballots"),
            })
    }

    async fn apply(&self, change: BallotChange) -> Result<BallotTally, BallotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let votes = conn
            .transaction(|conn| async move { apply_locked(conn, change).await }.scope_boxed())
            .await
            .map_err(|err| map_apply_error(err, change))?;
        Ok(BallotTally {
            post_id: change.post_id(),
            votes,
        })
    }
}
