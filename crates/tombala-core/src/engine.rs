// Event handlers for the game session.
//
// All handlers and every scheduled draw take the same session lock, so joins,
// starts, claims and draws are strictly serialized. Broadcasts are published
// while the lock is held, which keeps every subscriber's event order
// consistent with the order of state changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::hub::BroadcastHub;
use crate::ledger::Claim;
use crate::protocol::{ClientMessage, GameState, PlayerSnapshot, ServerEvent};
use crate::scheduler::{DrawScheduler, DrawTick, SchedulerState, StopReason, TickOutcome};
use crate::session::Session;

pub const IN_PROGRESS_MESSAGE: &str = "Game already in progress!";
pub const TOMBALA_RESET_MESSAGE: &str = "Game Over! New game can be started.";
pub const ALL_DRAWN_MESSAGE: &str = "Game Over - All numbers drawn!";
pub const GAME_OVER_MESSAGE: &str = "Game Over!";

/// Cloneable handle to the one game session of the process.
#[derive(Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<EngineState>,
    hub: BroadcastHub,
    draw_interval: Duration,
}

struct EngineState {
    session: Session,
    /// Scheduler of the latest round, if any round was started.
    scheduler: Option<DrawScheduler>,
}

impl Engine {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_session(Session::new(config), config.draw_interval())
    }

    pub fn with_session(session: Session, draw_interval: Duration) -> Self {
        Engine {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    session,
                    scheduler: None,
                }),
                hub: BroadcastHub::new(),
                draw_interval,
            }),
        }
    }

    // -- connection lifecycle -------------------------------------------------

    /// Subscribe a new connection and send it the current game state.
    pub async fn connect(&self, id: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let state = self.shared.state.lock().await;
        let rx = self.shared.hub.subscribe(id);
        self.shared
            .hub
            .send_to(id, ServerEvent::GameState(state.session.game_state(None)));
        info!(connection = id, "Client connected");
        rx
    }

    /// Unsubscribe a connection and drop its player, if it joined.
    pub async fn disconnect(&self, id: &str) {
        let mut state = self.shared.state.lock().await;
        self.shared.hub.unsubscribe(id);
        if state.session.leave(id).is_some() {
            self.shared.publish_roster(&state.session);
        }
        info!(connection = id, "Client disconnected");
    }

    // -- client events --------------------------------------------------------

    /// Dispatch a decoded client message.
    pub async fn handle(&self, id: &str, message: ClientMessage) -> Result<(), GameError> {
        debug!(connection = id, ?message, "Client message");
        match message {
            ClientMessage::Join => self.join(id).await.map(|_| ()),
            ClientMessage::Start => self.start(id).await.map(|_| ()),
            ClientMessage::Win { rows } => self.claim(id, rows).await.map(|_| ()),
            ClientMessage::Mark { number } => self.mark(id, number).await,
        }
    }

    /// Register `id` as a player. The board goes to `id` alone; the roster
    /// and game state go to everyone.
    pub async fn join(&self, id: &str) -> Result<Board, GameError> {
        let mut state = self.shared.state.lock().await;
        match state.session.join(id) {
            Ok(board) => {
                self.shared.hub.send_to(
                    id,
                    ServerEvent::Board {
                        board: board.clone(),
                    },
                );
                self.shared.publish_roster(&state.session);
                Ok(board)
            }
            Err(GameError::JoinRejected) => {
                self.shared.hub.send_to(
                    id,
                    ServerEvent::GameState(GameState {
                        active: state.session.is_active(),
                        can_start: false,
                        message: IN_PROGRESS_MESSAGE.into(),
                    }),
                );
                Err(GameError::JoinRejected)
            }
            Err(e) => Err(e),
        }
    }

    /// Start a round and its draw scheduler. Returns the round number.
    pub async fn start(&self, id: &str) -> Result<u64, GameError> {
        let mut guard = self.shared.state.lock().await;
        let state = &mut *guard;
        match state.session.start() {
            Ok(round) => {
                // A scheduler left from an earlier round is bound to that
                // round and can no longer draw; make sure it also exits.
                if let Some(previous) = state.scheduler.take() {
                    debug_assert!(previous.round() < round);
                    debug!(
                        previous_round = previous.round(),
                        state = ?previous.state(),
                        "Replacing draw scheduler"
                    );
                    previous.stop();
                }
                state.scheduler = Some(DrawScheduler::spawn(
                    Arc::downgrade(&self.shared),
                    round,
                    self.shared.draw_interval,
                ));
                info!(connection = id, round, "Round started by client");
                self.shared.publish_roster(&state.session);
                Ok(round)
            }
            Err(e @ GameError::StartRejected { required, .. }) => {
                debug!(connection = id, error = %e, "Start rejected");
                self.shared.hub.send_to(
                    id,
                    ServerEvent::GameState(state.session.game_state(Some(&format!(
                        "Need at least {required} players to start"
                    )))),
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Claim the tier for `rows` on behalf of `id`.
    ///
    /// A full-house claim stops the scheduler and resets the session for the
    /// next round, keeping scores.
    pub async fn claim(&self, id: &str, rows: i64) -> Result<Claim, GameError> {
        let mut guard = self.shared.state.lock().await;
        let state = &mut *guard;
        let claim = match state.session.claim(id, rows) {
            Ok(claim) => claim,
            Err(GameError::ClaimRejected(reason)) => {
                debug!(connection = id, rows, %reason, "Claim rejected");
                self.shared.hub.send_to(
                    id,
                    ServerEvent::ClaimRejected {
                        reason: reason.to_string(),
                    },
                );
                return Err(GameError::ClaimRejected(reason));
            }
            Err(e) => return Err(e),
        };

        let name = state
            .session
            .player(id)
            .map(|p| p.name.as_str())
            .unwrap_or(id);
        let mut message = format!("{name} won {} points!", claim.points);
        if claim.tier.ends_round() {
            message.push_str(" TOMBALA! Game Over!");
        }
        self.shared.publish_state(&state.session, Some(&message));
        self.shared.publish_players(&state.session);

        if claim.tier.ends_round() {
            if let Some(scheduler) = &state.scheduler {
                scheduler.stop();
            }
            state.session.reset();
            self.shared
                .publish_state(&state.session, Some(TOMBALA_RESET_MESSAGE));
            self.shared.publish_players(&state.session);
        }
        Ok(claim)
    }

    /// Record a number as marked on `id`'s board.
    pub async fn mark(&self, id: &str, number: u8) -> Result<(), GameError> {
        self.shared.state.lock().await.session.mark(id, number)
    }

    /// Force the session back to idle, stopping any running scheduler.
    /// Roster and scores are kept.
    pub async fn reset(&self) {
        let mut state = self.shared.state.lock().await;
        if let Some(scheduler) = &state.scheduler {
            scheduler.stop();
        }
        state.session.reset();
        warn!("Session reset");
        self.shared.publish_roster(&state.session);
    }

    // -- views ----------------------------------------------------------------

    pub async fn players(&self) -> Vec<PlayerSnapshot> {
        self.shared.state.lock().await.session.players()
    }

    pub async fn game_state(&self) -> GameState {
        self.shared.state.lock().await.session.game_state(None)
    }

    pub async fn drawn_numbers(&self) -> Vec<u8> {
        self.shared.state.lock().await.session.drawn_numbers().to_vec()
    }

    pub async fn scheduler_state(&self) -> SchedulerState {
        match &self.shared.state.lock().await.scheduler {
            Some(scheduler) => scheduler.state(),
            None => SchedulerState::Idle,
        }
    }

    /// Run `f` against the session under the lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.shared.state.lock().await.session)
    }
}

impl Shared {
    fn publish_players(&self, session: &Session) {
        self.hub.publish(ServerEvent::PlayerUpdate {
            players: session.players(),
        });
    }

    fn publish_state(&self, session: &Session, message: Option<&str>) {
        self.hub
            .publish(ServerEvent::GameState(session.game_state(message)));
    }

    /// Roster plus default game state, sent after any membership change.
    fn publish_roster(&self, session: &Session) {
        self.publish_players(session);
        self.publish_state(session, None);
    }
}

#[async_trait]
impl DrawTick for Shared {
    async fn tick(&self, round: u64) -> TickOutcome {
        let mut state = self.state.lock().await;
        let session = &mut state.session;
        if !session.is_active() || session.round() != round {
            return TickOutcome::Stop(StopReason::Deactivated);
        }

        let Some(number) = session.draw() else {
            session.deactivate();
            self.publish_state(session, Some(GAME_OVER_MESSAGE));
            return TickOutcome::Stop(StopReason::Exhausted);
        };
        self.hub.publish(ServerEvent::DrawnNumber { number });

        if session.pool().is_exhausted() {
            session.deactivate();
            self.publish_state(session, Some(ALL_DRAWN_MESSAGE));
            return TickOutcome::Stop(StopReason::Exhausted);
        }
        TickOutcome::Continue
    }
}
