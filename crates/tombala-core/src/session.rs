// The single game session: player registry, draw pool, claim ledger and the
// activity flag. Callers serialize all access (see `engine`).

use std::collections::{BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::ledger::{Claim, ClaimLedger};
use crate::pool::DrawPool;
use crate::protocol::{GameState, PlayerSnapshot};
use crate::ConnectionId;

pub const WAITING_MESSAGE: &str = "Waiting for players...";
pub const STARTED_MESSAGE: &str = "Game Started!";

/// A joined player.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnectionId,
    /// "Player N", assigned at join time.
    pub name: String,
    pub board: Board,
    /// Numbers the player reports as marked. Not checked against the draws.
    pub marked_numbers: BTreeSet<u8>,
    /// Never decreases while the player stays connected.
    pub score: u32,
    /// Position in join order.
    seq: u64,
}

impl Player {
    /// Board rows fully covered by the player's marks. Informational only.
    pub fn completed_rows(&self) -> BTreeSet<usize> {
        self.board.completed_rows(&self.marked_numbers)
    }
}

/// The session state. One instance lives for the whole process; rounds come
/// and go through [`Session::start`] and [`Session::reset`] while the roster
/// and scores carry over.
#[derive(Debug)]
pub struct Session {
    players: HashMap<ConnectionId, Player>,
    pool: DrawPool,
    ledger: ClaimLedger,
    active: bool,
    /// Set by `start`, cleared by `reset` and by a full house. Outlives
    /// `active` when the pool runs dry so the last draw can still be claimed.
    claims_open: bool,
    /// Incremented on every accepted start.
    round: u64,
    /// Total joins so far; drives player naming.
    joins: u64,
    min_players: usize,
    rng: StdRng,
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Build a session with a caller-supplied random source.
    pub fn with_rng(config: &GameConfig, rng: StdRng) -> Self {
        Session {
            players: HashMap::new(),
            pool: DrawPool::new(config.max_number),
            ledger: ClaimLedger::new(),
            active: false,
            claims_open: false,
            round: 0,
            joins: 0,
            min_players: config.min_players,
            rng,
        }
    }

    // -- roster -------------------------------------------------------------

    /// Register `id` as a player and hand back its new board.
    pub fn join(&mut self, id: &str) -> Result<Board, GameError> {
        if self.active {
            warn!(player_id = id, "Join rejected, game in progress");
            return Err(GameError::JoinRejected);
        }
        if self.players.contains_key(id) {
            return Err(GameError::AlreadyJoined(id.to_string()));
        }

        let board = Board::generate(self.pool.max_number(), &mut self.rng)?;
        self.joins += 1;
        let player = Player {
            id: id.to_string(),
            name: format!("Player {}", self.joins),
            board: board.clone(),
            marked_numbers: BTreeSet::new(),
            score: 0,
            seq: self.joins,
        };
        info!(player_id = id, name = %player.name, "Player joined");
        self.players.insert(id.to_string(), player);
        Ok(board)
    }

    /// Remove `id` from the roster. Allowed at any time, mid-round included.
    pub fn leave(&mut self, id: &str) -> Option<Player> {
        let removed = self.players.remove(id);
        if let Some(player) = &removed {
            info!(player_id = id, name = %player.name, score = player.score, "Player left");
        }
        removed
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Roster snapshot in join order.
    pub fn players(&self) -> Vec<PlayerSnapshot> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.seq);
        players
            .into_iter()
            .map(|p| PlayerSnapshot {
                id: p.id.clone(),
                name: p.name.clone(),
                score: p.score,
                achievements: self
                    .ledger
                    .tiers_held_by(&p.id)
                    .into_iter()
                    .map(|tier| tier.title().to_string())
                    .collect(),
            })
            .collect()
    }

    // -- round lifecycle ----------------------------------------------------

    pub fn can_start(&self) -> bool {
        !self.active && self.players.len() >= self.min_players
    }

    /// Activate a new round on a freshly reset pool and ledger. Returns the
    /// new round number.
    pub fn start(&mut self) -> Result<u64, GameError> {
        if self.active {
            return Err(GameError::AlreadyRunning);
        }
        if self.players.len() < self.min_players {
            return Err(GameError::StartRejected {
                players: self.players.len(),
                required: self.min_players,
            });
        }

        self.reset();
        self.active = true;
        self.claims_open = true;
        self.round += 1;
        info!(round = self.round, players = self.players.len(), "Round started");
        Ok(self.round)
    }

    /// Draw the next number for the active round. Returns `None` when the
    /// session is inactive or the pool is exhausted.
    pub fn draw(&mut self) -> Option<u8> {
        if !self.active {
            return None;
        }
        let number = self.pool.draw_next(&mut self.rng)?;
        debug!(number, remaining = self.pool.remaining(), "Number drawn");
        Some(number)
    }

    /// Claim the tier for `rows` on behalf of `id` and credit the points.
    /// Accepted from `start` until `reset` or a full house, which includes
    /// the gap after the pool is exhausted. A full-house claim deactivates
    /// the session.
    pub fn claim(&mut self, id: &str, rows: i64) -> Result<Claim, GameError> {
        if !self.claims_open {
            return Err(GameError::NotActive);
        }
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))?;

        let claim = self.ledger.try_claim(id, rows)?;
        player.score += claim.points;
        info!(
            player_id = id,
            tier = ?claim.tier,
            points = claim.points,
            score = player.score,
            "Claim accepted"
        );

        if claim.tier.ends_round() {
            self.claims_open = false;
            self.deactivate();
        }
        Ok(claim)
    }

    /// Record `number` as marked by `id`.
    pub fn mark(&mut self, id: &str, number: u8) -> Result<(), GameError> {
        if number == 0 || number > self.pool.max_number() {
            return Err(GameError::InvalidNumber(number));
        }
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))?;
        player.marked_numbers.insert(number);
        Ok(())
    }

    pub fn deactivate(&mut self) {
        if self.active {
            info!(round = self.round, drawn = self.pool.drawn().len(), "Round ended");
        }
        self.active = false;
    }

    /// Clear draws, claims and marks and deactivate. Roster and scores stay.
    pub fn reset(&mut self) {
        self.pool.reset();
        self.ledger.reset();
        self.active = false;
        self.claims_open = false;
        for player in self.players.values_mut() {
            player.marked_numbers.clear();
        }
        debug!(round = self.round, "Session reset");
    }

    // -- views --------------------------------------------------------------

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn claims_open(&self) -> bool {
        self.claims_open
    }

    pub fn pool(&self) -> &DrawPool {
        &self.pool
    }

    pub fn ledger(&self) -> &ClaimLedger {
        &self.ledger
    }

    pub fn drawn_numbers(&self) -> &[u8] {
        self.pool.drawn()
    }

    /// Status snapshot; `message` overrides the default idle/active text.
    pub fn game_state(&self, message: Option<&str>) -> GameState {
        let default = if self.active {
            STARTED_MESSAGE
        } else {
            WAITING_MESSAGE
        };
        GameState {
            active: self.active,
            can_start: self.can_start(),
            message: message.unwrap_or(default).to_string(),
        }
    }
}
