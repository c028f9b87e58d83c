//! PostgreSQL adapters built on Diesel, `diesel-async` and `bb8`.
//!
//! Each adapter translates between Diesel rows (`models.rs`, `schema.rs`,
//! both private) and domain types, and maps database failures onto its
//! port's error type. Uniqueness and compare-and-swap guarantees are
//! enforced by constraints and conditional statements, not by the adapters.
//!
//! ```no_run
//! use addon_backend::outbound::persistence::{
//!     DbPool, DieselGameStore, PoolConfig, run_pending_migrations,
//! };
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "postgres://addon@localhost/addon";
//! run_pending_migrations(url).await?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let games = DieselGameStore::new(pool);
//! # let _ = games;
//! # Ok(())
//! # }
//! ```

mod diesel_account_repository;
pub(crate) mod diesel_basic_error_mapping;
mod diesel_game_store;
mod diesel_idempotency_store;
mod diesel_problem_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_game_store::DieselGameStore;
pub use diesel_idempotency_store::DieselIdempotencyStore;
pub use diesel_problem_repository::DieselProblemRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
