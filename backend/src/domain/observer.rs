//! Polling observer that keeps one viewer's game state current.
//!
//! The observer owns a single background task. The task fetches the full
//! state on activation, then polls on a fixed interval only while the game is
//! active and another player holds the turn. Manual refreshes run on the same
//! task so fetches never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::ports::GameQuery;
use crate::domain::{Error, GameId, GameStateView, UserId};

type RefreshReply = oneshot::Sender<Result<GameStateView, Error>>;

const STOPPED_MESSAGE: &str = "game observer has been deactivated";

/// Background poller for one `(game, viewer)` pair.
pub struct GameObserver {
    query: Arc<dyn GameQuery>,
    game_id: GameId,
    viewer: UserId,
    poll_interval: Duration,
}

impl GameObserver {
    /// Spawn the observer task and perform the initial fetch.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn activate(
        query: Arc<dyn GameQuery>,
        game_id: GameId,
        viewer: UserId,
        poll_interval: Duration,
    ) -> GameObserverHandle {
        let (views_tx, views_rx) = watch::channel(None);
        let (refresh_tx, refresh_rx) = mpsc::channel(8);
        let observer = Self {
            query,
            game_id,
            viewer,
            poll_interval,
        };
        let task = tokio::spawn(observer.run(refresh_rx, views_tx));
        GameObserverHandle {
            game_id,
            views: views_rx,
            refreshes: refresh_tx,
            task,
        }
    }

    async fn run(
        self,
        mut refreshes: mpsc::Receiver<RefreshReply>,
        views: watch::Sender<Option<GameStateView>>,
    ) {
        debug!(game_id = %self.game_id, viewer = %self.viewer, "observer started");
        if let Err(err) = self.fetch(&views).await {
            debug!(game_id = %self.game_id, error = %err, "initial fetch failed");
        }

        loop {
            let polling = self.should_poll(&views);
            tokio::select! {
                request = refreshes.recv() => {
                    let Some(reply) = request else {
                        break;
                    };
                    let result = self.fetch(&views).await;
                    if reply.send(result).is_err() {
                        debug!(game_id = %self.game_id, "refresh caller went away");
                    }
                }
                () = tokio::time::sleep(self.poll_interval), if polling => {
                    if let Err(err) = self.fetch(&views).await {
                        debug!(game_id = %self.game_id, error = %err, "poll failed");
                    }
                }
            }
        }
        debug!(game_id = %self.game_id, "observer stopped");
    }

    // Until a first view arrives the status is unknown, so keep retrying.
    fn should_poll(&self, views: &watch::Sender<Option<GameStateView>>) -> bool {
        views
            .borrow()
            .as_ref()
            .is_none_or(GameStateView::awaits_other_player)
    }

    async fn fetch(
        &self,
        views: &watch::Sender<Option<GameStateView>>,
    ) -> Result<GameStateView, Error> {
        match self.query.load_state(&self.game_id, &self.viewer).await {
            Ok(view) => {
                views.send_replace(Some(view.clone()));
                Ok(view)
            }
            Err(err) => {
                warn!(
                    game_id = %self.game_id,
                    code = ?err.code(),
                    error = %err,
                    "game state fetch failed; keeping previous view"
                );
                Err(err)
            }
        }
    }
}

/// Handle to a running [`GameObserver`].
///
/// Dropping the handle deactivates the observer.
pub struct GameObserverHandle {
    game_id: GameId,
    views: watch::Receiver<Option<GameStateView>>,
    refreshes: mpsc::Sender<RefreshReply>,
    task: JoinHandle<()>,
}

impl GameObserverHandle {
    /// Observed game.
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Most recent successfully fetched view, if any.
    pub fn latest(&self) -> Option<GameStateView> {
        self.views.borrow().clone()
    }

    /// Receiver notified whenever a fetch publishes a new view.
    pub fn subscribe(&self) -> watch::Receiver<Option<GameStateView>> {
        self.views.clone()
    }

    /// Fetch the full state now and return it.
    ///
    /// The fetch runs on the observer task after any fetch already in flight.
    /// Fails with `service_unavailable` once the observer is deactivated.
    pub async fn refresh(&self) -> Result<GameStateView, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.refreshes
            .send(reply_tx)
            .await
            .map_err(|_| Error::service_unavailable(STOPPED_MESSAGE))?;
        reply_rx
            .await
            .map_err(|_| Error::service_unavailable(STOPPED_MESSAGE))?
    }

    /// Whether the background task is still running.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling immediately, cancelling any fetch in flight.
    pub fn deactivate(&self) {
        self.task.abort();
    }
}

impl Drop for GameObserverHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
