//! Idempotency primitives for safely retried game mutations.
//!
//! A caller may attach an [`IdempotencyKey`] to any mutating engine
//! operation. The first request under a key claims it, runs, and stores its
//! response; later requests with the same key and an equivalent payload get
//! that response back without touching game state. Reusing a key with a
//! different payload is a conflict.
//!
//! Keys are scoped per user and per [`MutationType`], so two players can
//! never collide and one key cannot be replayed across operations.
//!
//! Payload equivalence is decided by [`PayloadHash`]: the request is
//! serialised to JSON, object keys are sorted recursively, and SHA-256 is
//! taken over the compact encoding.
//!
//! Records expire after the TTL in [`IdempotencyConfig`]; an expired record
//! no longer blocks its key.

mod config;
mod key;
mod mutation_type;
mod payload;
mod record;

pub use config::IdempotencyConfig;
pub use key::{IdempotencyKey, IdempotencyKeyValidationError};
pub use mutation_type::{MutationType, ParseMutationTypeError};
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash, hash_request};
pub use record::{ClaimOutcome, IdempotencyRecord, IdempotencyScope, RecordState};
