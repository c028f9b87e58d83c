//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports ([`GameCommand`], [`GameQuery`], [`ProblemCommand`],
//! [`ProblemQuery`], [`AccountService`]) are implemented by domain services
//! and called by inbound adapters. Driven ports ([`GameStore`],
//! [`IdempotencyStore`], [`ProblemRepository`], [`AccountRepository`]) are
//! implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_repository;
mod account_service;
mod game_command;
mod game_query;
mod game_store;
mod idempotency_store;
mod problem_command;
mod problem_query;
mod problem_repository;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{
    AccountRepository, AccountRepositoryError, FixtureAccountRepository,
};
#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::{AccountService, FixtureAccountService};

pub(crate) use game_command::{parse_hold, parse_location, parse_max_players, parse_room_code};
#[cfg(test)]
pub use game_command::MockGameCommand;
pub use game_command::{
    AddMovePayload, AddMoveRequest, CreateSessionPayload, CreateSessionRequest,
    FixtureGameCommand, GameCommand, JoinSessionPayload, JoinSessionRequest, StartSessionRequest,
};
#[cfg(test)]
pub use game_query::MockGameQuery;
pub use game_query::{FixtureGameQuery, GameQuery};
#[cfg(test)]
pub use game_store::MockGameStore;
pub use game_store::{
    FixtureGameStore, GameStore, GameStoreError, SessionExpectation, SessionPatch,
};
#[cfg(test)]
pub use idempotency_store::MockIdempotencyStore;
pub use idempotency_store::{FixtureIdempotencyStore, IdempotencyStore, IdempotencyStoreError};
pub(crate) use problem_command::{parse_new_problem, parse_problem_changes, problem_field_error};
#[cfg(test)]
pub use problem_command::MockProblemCommand;
pub use problem_command::{
    CreateProblemPayload, CreateProblemRequest, DeleteProblemRequest, FixtureProblemCommand,
    ProblemCommand, UpdateProblemPayload, UpdateProblemRequest,
};
#[cfg(test)]
pub use problem_query::MockProblemQuery;
pub use problem_query::{FixtureProblemQuery, ProblemQuery};
#[cfg(test)]
pub use problem_repository::MockProblemRepository;
pub use problem_repository::{
    FixtureProblemRepository, ProblemRepository, ProblemRepositoryError,
};
