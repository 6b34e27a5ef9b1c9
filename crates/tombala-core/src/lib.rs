// Library root: the tombala session engine.
//
// Leaves first: board generation, the draw pool and the claim ledger are
// plain data structures. `session` composes them into the single mutable
// game state, `engine` guards that state behind one lock and drives the
// `scheduler` and the `hub`.

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod hub;
pub mod ledger;
pub mod pool;
pub mod protocol;
pub mod scheduler;
pub mod session;

/// Opaque per-connection identifier assigned by the transport.
pub type ConnectionId = String;

pub use board::Board;
pub use config::{Config, GameConfig, ServerConfig};
pub use engine::Engine;
pub use error::{BoardError, ClaimRejection, ConfigError, GameError};
pub use ledger::{Claim, ClaimLedger, Tier};
pub use pool::DrawPool;
pub use protocol::{ClientMessage, GameState, PlayerSnapshot, ServerEvent};
pub use scheduler::{DrawScheduler, SchedulerState, StopReason};
pub use session::{Player, Session};
