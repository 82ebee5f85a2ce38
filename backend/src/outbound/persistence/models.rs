//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{accounts, ballots, posts};

/// Row struct for reading from the accounts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating accounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
}

/// Row struct for reading from the posts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub owner_id: i64,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating posts. `votes` starts at the column default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub published: bool,
    pub owner_id: i64,
}

/// Partial update of a post; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = posts)]
pub(crate) struct PostChangeset<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub published: Option<bool>,
}

/// Row struct for reading from the ballots table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ballots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BallotRow {
    #[expect(dead_code, reason = "surrogate key; ballots are addressed by (account, post)")]
    pub id: i64,
    pub account_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for casting a ballot.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = ballots)]
pub(crate) struct NewBallotRow {
    pub account_id: i64,
    pub post_id: i64,
}
