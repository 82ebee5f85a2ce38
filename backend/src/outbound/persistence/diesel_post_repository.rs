//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.
//!
//! Every read joins `accounts` so the owner's username arrives with the post.
//! Listings are ordered newest first with the id as a tie-breaker.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{PostRepository, PostRepositoryError};
use crate::domain::{
    AccountId, PageRequest, Post, PostChanges, PostDraft, PostId, PostView, Username,
};

use super::diesel_error_mapping::{classify_diesel_error, map_basic_failure, pool_error_message};
use super::models::{NewPostRow, PostChangeset, PostRow};
use super::pool::{DbPool, PoolError};
use super::schema::{accounts, posts};

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PostRepositoryError {
    PostRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> PostRepositoryError {
    map_basic_failure(
        classify_diesel_error(error),
        PostRepositoryError::query,
        PostRepositoryError::connection,
    )
}

type ViewRow = (PostRow, String);

fn row_to_view((row, owner_username): ViewRow) -> Result<PostView, PostRepositoryError> {
    let owner_username = Username::new(&owner_username).map_err(|err| {
        PostRepositoryError::query(format!("stored username invalid: {err}"))
    })?;
    Ok(PostView {
        post: Post {
            id: PostId::new(row.id),
            title: row.title,
            content: row.content,
            published: row.published,
            owner_id: AccountId::new(row.owner_id),
            created_at: row.created_at,
            votes: row.votes,
        },
        owner_username,
    })
}

fn rows_to_views(rows: Vec<ViewRow>) -> Result<Vec<PostView>, PostRepositoryError> {
    rows.into_iter().map(row_to_view).collect()
}

async fn load_view(
    conn: &mut AsyncPgConnection,
    id: i64,
) -> Result<Option<PostView>, PostRepositoryError> {
    posts::table
        .inner_join(accounts::table)
        .filter(posts::id.eq(id))
        .select((PostRow::as_select(), accounts::username))
        .first::<ViewRow>(conn)
        .await
        .optional()
        .map_err(map_diesel_error)?
        .map(row_to_view)
        .transpose()
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn create(
        &self,
        owner_id: AccountId,
        draft: &PostDraft,
    ) -> Result<PostView, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewPostRow {
            title: draft.title.as_ref(),
            content: draft.content.as_ref(),
            published: draft.published,
            owner_id: owner_id.get(),
        };

        let id: i64 = diesel::insert_into(posts::table)
            .values(&new_row)
            .returning(posts::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        load_view(&mut conn, id)
            .await?
            .ok_or_else(|| PostRepositoryError::query("inserted post vanished"))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<PostView>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_view(&mut conn, id.get()).await
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<PostView>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ViewRow> = posts::table
            .inner_join(accounts::table)
            .select((PostRow::as_select(), accounts::username))
            .order((posts::created_at.desc(), posts::id.desc()))
            .offset(page.offset())
            .limit(page.limit())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_views(rows)
    }

    async fn list_by_owner(
        &self,
        owner_id: AccountId,
    ) -> Result<Vec<PostView>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ViewRow> = posts::table
            .inner_join(accounts::table)
            .filter(posts::owner_id.eq(owner_id.get()))
            .select((PostRow::as_select(), accounts::username))
            .order((posts::created_at.desc(), posts::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_views(rows)
    }

    async fn update(
        &self,
        id: PostId,
        owner_id: AccountId,
        changes: &PostChanges,
    ) -> Result<Option<PostView>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owned = posts::table
            .filter(posts::id.eq(id.get()))
            .filter(posts::owner_id.eq(owner_id.get()));

        // An all-`None` changeset is rejected by Diesel, so only check the row.
        let matched = if changes.is_empty() {
            owned
                .select(posts::id)
                .first::<i64>(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
        } else {
            let changeset = PostChangeset {
                title: changes.title.as_ref().map(AsRef::as_ref),
                content: changes.content.as_ref().map(AsRef::as_ref),
                published: changes.published,
            };
            diesel::update(owned)
                .set(&changeset)
                .returning(posts::id)
                .get_result::<i64>(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
        };

        match matched {
            Some(id) => load_view(&mut conn, id).await,
            None => Ok(None),
        }
    }

    async fn delete(&self, id: PostId, owner_id: AccountId) -> Result<bool, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            posts::table
                .filter(posts::id.eq(id.get()))
                .filter(posts::owner_id.eq(owner_id.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn set_vote_count(&self, id: PostId, votes: i64) -> Result<(), PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(posts::table.filter(posts::id.eq(id.get())))
            .set(posts::votes.eq(votes))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
