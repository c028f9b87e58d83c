//! Driving port for reading game state.

use async_trait::async_trait;

use crate::domain::{Error, GameId, GameStateView, UserId};

/// Driving port for the observer's full-state fetch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameQuery: Send + Sync {
    /// Fetch session, players and moves and derive the viewer's projection.
    async fn load_state(&self, game_id: &GameId, viewer: &UserId) -> Result<GameStateView, Error>;
}

/// Fixture query that knows no games.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureGameQuery;

#[async_trait]
impl GameQuery for FixtureGameQuery {
    async fn load_state(&self, game_id: &GameId, _viewer: &UserId) -> Result<GameStateView, Error> {
        Err(Error::not_found(format!("game {game_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[tokio::test]
    async fn fixture_query_reports_not_found() {
        let err = FixtureGameQuery
            .load_state(&GameId::random(), &UserId::random())
            .await
            .expect_err("unknown game");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
