//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the account, post, and ballot repository ports
//! backed by `diesel-async` over a `bb8` pool. Row structs (`models.rs`) and
//! table definitions (`schema.rs`) stay private to this module; adapters only
//! translate between rows and domain types.
//!
//! # Example
//!
//! ```no_run
//! use upvote::outbound::persistence::{DbPool, DieselPostRepository, PoolConfig};
//!
//! # async fn connect() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/upvote")).await?;
//! let posts = DieselPostRepository::new(pool);
//! # let _ = posts;
//! # Ok(())
//! # }
//! ```

mod diesel_account_repository;
mod diesel_ballot_repository;
pub(crate) mod diesel_error_mapping;
mod diesel_post_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_ballot_repository::DieselBallotRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
