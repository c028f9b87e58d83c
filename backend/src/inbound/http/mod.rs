//! HTTP inbound adapter exposing the game engine, the problem library and
//! accounts as REST endpoints.

pub mod accounts;
pub mod error;
pub mod games;
pub mod health;
pub mod idempotency;
pub mod problems;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;
