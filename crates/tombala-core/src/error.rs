// Error taxonomy for the session engine and its configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::Tier;
use crate::ConnectionId;

/// Rejections returned by the engine's event handlers. None of these are
/// fatal: each leaves the session state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game already in progress")]
    JoinRejected,

    #[error("connection {0} has already joined")]
    AlreadyJoined(ConnectionId),

    #[error("need at least {required} players to start, have {players}")]
    StartRejected { players: usize, required: usize },

    #[error("a round is already running")]
    AlreadyRunning,

    #[error("no round is in progress")]
    NotActive,

    #[error("unknown player {0}")]
    UnknownPlayer(ConnectionId),

    #[error("number {0} is outside the game range")]
    InvalidNumber(u8),

    #[error("claim rejected: {0}")]
    ClaimRejected(#[from] ClaimRejection),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Why a tier claim was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClaimRejection {
    #[error("{0} is not a claimable row count")]
    InvalidRows(i64),

    #[error("{} has already been claimed", .0.title())]
    TierTaken(Tier),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("range 1..={max_number} cannot supply {required} distinct numbers")]
    RangeTooSmall { max_number: u8, required: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}
