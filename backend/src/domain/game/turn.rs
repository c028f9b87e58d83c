//! Turn rotation over the seated players.

use crate::domain::UserId;

use super::GamePlayer;

fn rotation(players: &[GamePlayer]) -> Vec<&GamePlayer> {
    let mut seated: Vec<&GamePlayer> = players.iter().filter(|p| !p.is_eliminated).collect();
    seated.sort_by_key(|p| p.turn_order);
    seated
}

/// Player who acts first once the game starts: the lowest seated turn order.
pub fn first_turn(players: &[GamePlayer]) -> Option<&GamePlayer> {
    rotation(players).into_iter().next()
}

/// Player who acts after `current`, wrapping from the last seat to the first.
///
/// Returns `None` when `current` is not a seated player.
///
/// # Examples
/// ```
/// use addon_backend::domain::{next_turn, GameId, GamePlayer, UserId, Username};
/// use chrono::Utc;
///
/// let game_id = GameId::random();
/// let seat = |turn_order| GamePlayer {
///     game_id,
///     user_id: UserId::random(),
///     username: Username::new("climber").expect("valid name"),
///     turn_order,
///     is_eliminated: false,
///     joined_at: Utc::now(),
///     eliminated_at: None,
/// };
/// let players = vec![seat(0), seat(1)];
/// let after_last = next_turn(&players, &players[1].user_id).expect("seated");
/// assert_eq!(after_last.user_id, players[0].user_id);
/// ```
pub fn next_turn<'a>(players: &'a [GamePlayer], current: &UserId) -> Option<&'a GamePlayer> {
    let seated = rotation(players);
    let position = seated.iter().position(|p| &p.user_id == current)?;
    let next = position.saturating_add(1).checked_rem(seated.len())?;
    seated.get(next).copied()
}
