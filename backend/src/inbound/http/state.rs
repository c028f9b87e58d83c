//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on the driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountService, FixtureAccountService, FixtureProblemCommand, FixtureProblemQuery,
    GameCommand, GameQuery, ProblemCommand, ProblemQuery,
};

/// Parameter object bundling the game engine ports.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// State-changing engine operations.
    pub games: Arc<dyn GameCommand>,
    /// Full-state reads.
    pub games_query: Arc<dyn GameQuery>,
}

/// Ports for the problem library and account endpoints.
#[derive(Clone)]
pub struct HttpStateExtraPorts {
    /// Problem mutations.
    pub problems: Arc<dyn ProblemCommand>,
    /// Problem reads.
    pub problems_query: Arc<dyn ProblemQuery>,
    /// Email and password authentication.
    pub accounts: Arc<dyn AccountService>,
}

impl Default for HttpStateExtraPorts {
    fn default() -> Self {
        Self {
            problems: Arc::new(FixtureProblemCommand),
            problems_query: Arc::new(FixtureProblemQuery),
            accounts: Arc::new(FixtureAccountService),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// State-changing engine operations.
    pub games: Arc<dyn GameCommand>,
    /// Full-state reads.
    pub games_query: Arc<dyn GameQuery>,
    /// Problem mutations.
    pub problems: Arc<dyn ProblemCommand>,
    /// Problem reads.
    pub problems_query: Arc<dyn ProblemQuery>,
    /// Email and password authentication.
    pub accounts: Arc<dyn AccountService>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Bundle the game ports; problem and account ports use fixtures.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use addon_backend::domain::ports::{FixtureGameCommand, FixtureGameQuery};
    /// use addon_backend::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts {
    ///     games: Arc::new(FixtureGameCommand),
    ///     games_query: Arc::new(FixtureGameQuery),
    /// });
    /// let _games = state.games.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        Self::new_with_extra(ports, HttpStateExtraPorts::default())
    }

    /// Bundle every port explicitly.
    pub fn new_with_extra(ports: HttpStatePorts, extra: HttpStateExtraPorts) -> Self {
        let HttpStatePorts { games, games_query } = ports;
        let HttpStateExtraPorts {
            problems,
            problems_query,
            accounts,
        } = extra;
        Self {
            games,
            games_query,
            problems,
            problems_query,
            accounts,
        }
    }
}
