//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: process-local stores that honour the same uniqueness and
//!   compare-and-swap guarantees as the database adapters. Used by tests and
//!   when no database is configured.
//! - **persistence**: PostgreSQL adapters over Diesel and `diesel-async`.
//!
//! Adapters are thin translators between domain types and their storage
//! representation. They contain no game rules.

pub mod memory;
pub mod persistence;
