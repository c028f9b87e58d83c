//! Turn-based add-on bouldering game backend.
//!
//! - [`domain`]: game, problem and account records, the engine and the ports.
//! - [`outbound`]: in-process and PostgreSQL adapters.
//! - [`inbound`]: the actix-web REST adapter.
//! - [`middleware`]: request tracing.
//! - [`doc`]: the OpenAPI document.
//! - [`settings`]: runtime configuration.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::Trace;
