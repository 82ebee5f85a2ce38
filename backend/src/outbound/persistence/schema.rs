//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts. `email` and `username` are each unique.
    accounts (id) {
        id -> Int8,
        email -> Varchar,
        username -> Varchar,
        password_hash -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Posts with their denormalised ballot count.
    posts (id) {
        id -> Int8,
        title -> Varchar,
        content -> Text,
        published -> Bool,
        owner_id -> Int8,
        /// Equals the number of `ballots` rows for this post.
        votes -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per vote; unique on `(account_id, post_id)`.
    ballots (id) {
        id -> Int8,
        account_id -> Int8,
        post_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(posts -> accounts (owner_id));
diesel::joinable!(ballots -> posts (post_id));
diesel::joinable!(ballots -> accounts (account_id));

diesel::allow_tables_to_appear_in_same_query!(accounts, posts, ballots);
