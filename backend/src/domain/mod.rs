//! Domain primitives, the turn-based game engine and its observer.
//!
//! Purpose: define strongly typed game records, the rules that move a session
//! from lobby to play, and the polling projection clients watch. Adapters
//! reach the domain only through the ports in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure taxonomy.
//! - TraceId: request correlation identifier carried by errors.
//! - UserId / Username / Actor: explicit caller identity.
//! - Game records (`GameSession`, `GamePlayer`, `GameMove`) and value types.
//! - GameCommandService / GameQueryService: engine implementations of the
//!   driving ports.
//! - RetryingGameCommand: single-retry-with-backoff decorator.
//! - GameObserver: polling state observer.
//! - IdempotencySweeper: background purge of expired idempotency records.
//! - Problem records and ProblemService: climbing problems with tagged holds.
//! - Account records and AccountCommandService: email and password sign-in.

pub mod account;
mod account_service;
pub mod error;
pub mod game;
mod game_service;
mod game_service_idempotency;
pub mod idempotency;
pub mod idempotency_sweeper;
pub mod observer;
pub mod ports;
pub mod problem;
mod problem_service;
pub mod retry;
pub mod trace_id;
pub mod user;

pub use self::account::{
    Account, AccountValidationError, Email, EMAIL_MAX, NewAccount, PASSWORD_MAX, PASSWORD_MIN,
    Password, PasswordDigest, SignInCredentials, SignUpCredentials, StoredAccount,
};
pub use self::account_service::AccountCommandService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::game::{
    GameId, GameMove, GamePlayer, GameSession, GameStateView, GameStatus, GameValidationError,
    HoldDescription, Location, MAX_PLAYERS_RANGE, MaxPlayers, NewGameMove, NewGamePlayer,
    NewGameSession, PhotoUrl, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RandomRoomCodeGenerator,
    RoomCode, RoomCodeGenerator, first_turn, next_turn,
};
pub use self::game_service::{GameCommandService, GameEngineConfig, GameQueryService};
pub use self::idempotency::{
    ClaimOutcome, IdempotencyConfig, IdempotencyKey, IdempotencyKeyValidationError, IdempotencyRecord,
    IdempotencyScope, MutationType, PayloadHash, PayloadHashError, RecordState,
    canonicalize_and_hash, hash_request,
};
pub use self::idempotency_sweeper::IdempotencySweeper;
pub use self::observer::{GameObserver, GameObserverHandle};
pub use self::problem::{
    Difficulty, Hold, HoldType, MAX_HOLDS, MAX_TAGS, NewProblem, PROBLEM_LIST_LIMIT,
    PROBLEM_NAME_MAX, PROBLEM_SEARCH_LIMIT, Problem, ProblemChanges, ProblemFilter, ProblemId,
    ProblemName, ProblemValidationError, TAG_MAX, Tag, normalise_tags,
};
pub use self::problem_service::ProblemService;
pub use self::retry::{
    AttemptJitter, BackoffJitter, RetryPolicy, RetryingGameCommand, Sleeper, TokioSleeper,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Actor, USERNAME_MAX, UserId, UserValidationError, Username};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use addon_backend::domain::{ApiResult, Error};
///
/// fn start() -> ApiResult<()> {
///     Err(Error::forbidden("only the host can start the game"))
/// }
/// assert!(start().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
