//! Pick storage adapters and assemble the HTTP state over them.

use std::sync::Arc;

use addon_backend::domain::ports::{
    AccountRepository, GameStore, IdempotencyStore, ProblemRepository,
};
use addon_backend::domain::{
    AccountCommandService, GameCommandService, GameQueryService, ProblemService,
    RandomRoomCodeGenerator, RetryingGameCommand,
};
use addon_backend::inbound::http::state::{HttpState, HttpStateExtraPorts, HttpStatePorts};
use addon_backend::outbound::memory::{
    InMemoryAccountRepository, InMemoryGameStore, InMemoryIdempotencyStore,
    InMemoryProblemRepository,
};
use addon_backend::outbound::persistence::{
    DieselAccountRepository, DieselGameStore, DieselIdempotencyStore, DieselProblemRepository,
};
use addon_backend::settings::GameSettings;
use mockable::Clock;

use super::ServerConfig;

/// HTTP state plus the idempotency store the background sweeper purges.
pub(crate) struct BuiltState {
    pub(crate) http_state: HttpState,
    pub(crate) idempotency: Arc<dyn IdempotencyStore>,
}

/// PostgreSQL adapters when a pool is configured, in-memory ones otherwise.
pub(crate) fn build_http_state(
    config: &ServerConfig,
    settings: &GameSettings,
    clock: &Arc<dyn Clock>,
) -> BuiltState {
    match &config.db_pool {
        Some(pool) => assemble(
            Arc::new(DieselGameStore::new(pool.clone())),
            Arc::new(DieselIdempotencyStore::new(pool.clone())),
            Arc::new(DieselProblemRepository::new(pool.clone())),
            Arc::new(DieselAccountRepository::new(pool.clone())),
            settings,
            clock,
        ),
        None => assemble(
            Arc::new(InMemoryGameStore::new()),
            Arc::new(InMemoryIdempotencyStore::new()),
            Arc::new(InMemoryProblemRepository::new()),
            Arc::new(InMemoryAccountRepository::new()),
            settings,
            clock,
        ),
    }
}

fn assemble<S, I>(
    games: Arc<S>,
    idempotency: Arc<I>,
    problems: Arc<dyn ProblemRepository>,
    accounts: Arc<dyn AccountRepository>,
    settings: &GameSettings,
    clock: &Arc<dyn Clock>,
) -> BuiltState
where
    S: GameStore + 'static,
    I: IdempotencyStore + 'static,
{
    let engine = GameCommandService::new(
        games.clone(),
        idempotency.clone(),
        clock.clone(),
        Arc::new(RandomRoomCodeGenerator),
        settings.engine_config(),
    );
    let library = Arc::new(ProblemService::new(problems, clock.clone()));
    let http_state = HttpState::new_with_extra(
        HttpStatePorts {
            games: Arc::new(RetryingGameCommand::new(
                engine,
                settings.retry_policy(),
                clock.clone(),
            )),
            games_query: Arc::new(GameQueryService::new(games)),
        },
        HttpStateExtraPorts {
            problems: library.clone(),
            problems_query: library,
            accounts: Arc::new(AccountCommandService::new(accounts, clock.clone())),
        },
    );
    BuiltState {
        http_state,
        idempotency,
    }
}
