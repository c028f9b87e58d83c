//! Driving port for the game engine's state-changing operations.
//!
//! Every request names its [`Actor`] explicitly and may carry an
//! [`IdempotencyKey`] so clients can retry after a dropped response without
//! repeating the mutation.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Actor, Error, GameId, GameMove, GameSession, HoldDescription, IdempotencyKey, Location,
    MaxPlayers, NewGameMove, NewGameSession, PhotoUrl, RoomCode,
};

/// Client-supplied fields for creating a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    /// Where the group is climbing.
    pub location: String,
    /// Requested player limit.
    pub max_players: i64,
}

/// Client-supplied fields for joining a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionPayload {
    /// Code shown on the host's lobby screen, in any case.
    pub room_code: String,
}

/// Client-supplied fields for adding a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMovePayload {
    /// The hold being added.
    pub hold_description: String,
    /// Optional photo reference.
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Request to open a new lobby hosted by the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionRequest {
    /// Host.
    pub actor: Actor,
    /// Session settings.
    pub payload: CreateSessionPayload,
    /// Retry key.
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Request to join a lobby by room code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSessionRequest {
    /// Joining user.
    pub actor: Actor,
    /// Room code.
    pub payload: JoinSessionPayload,
    /// Retry key.
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Request to move a lobby into play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSessionRequest {
    /// Must be the host.
    pub actor: Actor,
    /// Target game.
    pub game_id: GameId,
    /// Retry key.
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Request to append a hold and pass the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMoveRequest {
    /// Must hold the current turn.
    pub actor: Actor,
    /// Target game.
    pub game_id: GameId,
    /// Hold details.
    pub payload: AddMovePayload,
    /// Retry key.
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Driving port for game mutations.
///
/// # Examples
///
/// ```rust,no_run
/// # use addon_backend::domain::{Actor, UserId, Username};
/// # use addon_backend::domain::ports::{
/// #     CreateSessionPayload, CreateSessionRequest, FixtureGameCommand, GameCommand,
/// # };
/// # async fn example() -> Result<(), addon_backend::domain::Error> {
/// let actor = Actor::new(UserId::random(), Username::new("host").expect("valid name"));
/// let session = FixtureGameCommand
///     .create_session(CreateSessionRequest {
///         actor,
///         payload: CreateSessionPayload {
///             location: "Gym A".to_owned(),
///             max_players: 4,
///         },
///         idempotency_key: None,
///     })
///     .await?;
/// assert_eq!(session.location.as_ref(), "Gym A");
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameCommand: Send + Sync {
    /// Open a lobby with the actor seated at turn order 0.
    async fn create_session(&self, request: CreateSessionRequest) -> Result<GameSession, Error>;

    /// Seat the actor in the lobby using the given room code.
    ///
    /// Joining a game the actor already belongs to returns the session
    /// unchanged.
    async fn join_session(&self, request: JoinSessionRequest) -> Result<GameSession, Error>;

    /// Activate the lobby and hand the first turn to turn order 0.
    async fn start_session(&self, request: StartSessionRequest) -> Result<GameSession, Error>;

    /// Append the actor's hold and pass the turn to the next player.
    async fn add_move(&self, request: AddMoveRequest) -> Result<GameMove, Error>;
}

pub(crate) fn parse_location(raw: &str) -> Result<Location, Error> {
    Location::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(serde_json::json!({
            "field": "location",
            "code": "empty_location",
        }))
    })
}

pub(crate) fn parse_max_players(raw: i64) -> Result<MaxPlayers, Error> {
    MaxPlayers::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(serde_json::json!({
            "field": "maxPlayers",
            "value": raw,
            "code": "max_players_out_of_range",
        }))
    })
}

pub(crate) fn parse_room_code(raw: &str) -> Result<RoomCode, Error> {
    // A malformed code can never match a lobby, so it reads as "not found".
    RoomCode::parse(raw).map_err(|err| Error::not_found(format!("no open game for that code: {err}")))
}

pub(crate) fn parse_hold(payload: &AddMovePayload) -> Result<(HoldDescription, Option<PhotoUrl>), Error> {
    let hold = HoldDescription::new(payload.hold_description.as_str()).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(serde_json::json!({
            "field": "holdDescription",
            "code": "empty_hold_description",
        }))
    })?;
    let photo = payload
        .photo_url
        .as_deref()
        .map(PhotoUrl::new)
        .transpose()
        .map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(serde_json::json!({
                "field": "photoUrl",
                "code": "empty_photo_url",
            }))
        })?;
    Ok((hold, photo))
}

/// Fixture command that validates input and echoes synthetic records.
///
/// No state is kept: joins and starts report the game as unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureGameCommand;

#[async_trait]
impl GameCommand for FixtureGameCommand {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<GameSession, Error> {
        let location = parse_location(&request.payload.location)?;
        let max_players = parse_max_players(request.payload.max_players)?;
        Ok(NewGameSession {
            host_id: request.actor.user_id,
            room_code: RoomCode::generate(&mut rand::thread_rng()),
            location,
            max_players,
            created_at: Utc::now(),
        }
        .into_session(GameId::random()))
    }

    async fn join_session(&self, request: JoinSessionRequest) -> Result<GameSession, Error> {
        let code = parse_room_code(&request.payload.room_code)?;
        Err(Error::not_found(format!("no open game for code {code}")))
    }

    async fn start_session(&self, request: StartSessionRequest) -> Result<GameSession, Error> {
        Err(Error::not_found(format!("game {} not found", request.game_id)))
    }

    async fn add_move(&self, request: AddMoveRequest) -> Result<GameMove, Error> {
        let (hold_description, photo_url) = parse_hold(&request.payload)?;
        Ok(NewGameMove {
            game_id: request.game_id,
            added_by_user_id: request.actor.user_id,
            added_by_username: request.actor.username,
            hold_description,
            photo_url,
            created_at: Utc::now(),
        }
        .into_move(Uuid::new_v4(), 1))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{ErrorCode, UserId, Username};

    #[fixture]
    fn actor() -> Actor {
        Actor::new(UserId::random(), Username::new("setter").expect("valid name"))
    }

    #[rstest]
    #[case("", 4, "location")]
    #[case("Gym A", 1, "maxPlayers")]
    #[case("Gym A", 13, "maxPlayers")]
    #[tokio::test]
    async fn fixture_create_rejects_invalid_settings(
        actor: Actor,
        #[case] location: &str,
        #[case] max_players: i64,
        #[case] field: &str,
    ) {
        let err = FixtureGameCommand
            .create_session(CreateSessionRequest {
                actor,
                payload: CreateSessionPayload {
                    location: location.to_owned(),
                    max_players,
                },
                idempotency_key: None,
            })
            .await
            .expect_err("invalid settings");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|d| d.get("field")).and_then(|f| f.as_str()),
            Some(field)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_add_move_trims_and_keeps_photo(actor: Actor) {
        let game_move = FixtureGameCommand
            .add_move(AddMoveRequest {
                actor: actor.clone(),
                game_id: GameId::random(),
                payload: AddMovePayload {
                    hold_description: "  red jug ".to_owned(),
                    photo_url: Some("https://example.test/jug.jpg".to_owned()),
                },
                idempotency_key: None,
            })
            .await
            .expect("valid move");

        assert_eq!(game_move.hold_description.as_ref(), "red jug");
        assert_eq!(game_move.added_by_user_id, actor.user_id);
        assert!(game_move.photo_url.is_some());
    }

    #[rstest]
    fn malformed_room_code_reads_as_not_found() {
        let err = parse_room_code("bad").expect_err("too short");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    fn add_move_payload_defaults_missing_photo() {
        let payload: AddMovePayload =
            serde_json::from_str(r#"{"holdDescription":"sloper"}"#).expect("valid payload");
        assert!(payload.photo_url.is_none());
    }
}
