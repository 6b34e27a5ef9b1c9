// Message types exchanged with clients.
//
// Every event travels as a JSON object `{"event": "<name>", "data": {...}}`.
// Payload-less events omit `data`.

use serde::{Deserialize, Serialize};

use crate::board::Board;

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Register as a player and receive a board.
    Join,
    /// Begin drawing, if enough players have joined.
    Start,
    /// Claim the tier for the given number of completed rows.
    Win { rows: i64 },
    /// Record a number as marked on the sender's board.
    Mark { number: u8 },
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Events the server sends to one or all clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent to the joining client only.
    Board { board: Board },
    /// Full roster snapshot.
    PlayerUpdate { players: Vec<PlayerSnapshot> },
    GameState(GameState),
    DrawnNumber { number: u8 },
    /// Feedback to a claimant whose claim was refused.
    ClaimRejected { reason: String },
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Board { .. } => "board",
            ServerEvent::PlayerUpdate { .. } => "playerUpdate",
            ServerEvent::GameState(_) => "gameState",
            ServerEvent::DrawnNumber { .. } => "drawnNumber",
            ServerEvent::ClaimRejected { .. } => "claimRejected",
        }
    }
}

/// One row of the roster broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub score: u32,
    /// Titles of the tiers this player holds in the current round.
    pub achievements: Vec<String>,
}

/// Session status as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub active: bool,
    pub can_start: bool,
    pub message: String,
}
