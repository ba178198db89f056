//! Game simulation modules

pub mod battle;
pub mod combat;
pub mod entities;
pub mod physics;
pub mod session;
pub mod snapshot;
pub mod units;
pub mod validator;

pub use session::{RoomInfo, Session};
pub use validator::{CommandValidator, Rejection};

use crate::ws::protocol::Command;
use uuid::Uuid;

/// Shared id space for towers and units within one battle
pub type EntityId = u64;

/// Validated command waiting for the next tick
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub player_id: Uuid,
    pub command: Command,
}
