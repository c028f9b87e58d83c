//! In-process adapters for the driven ports.
//!
//! Each store keeps its state behind one mutex and never awaits while holding
//! it, so every port method is atomic with respect to the others.

mod account_repository;
mod game_store;
mod idempotency_store;
mod problem_repository;

pub use account_repository::InMemoryAccountRepository;
pub use game_store::InMemoryGameStore;
pub use idempotency_store::InMemoryIdempotencyStore;
pub use problem_repository::InMemoryProblemRepository;
