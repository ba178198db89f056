//! Matchmaking: FIFO queue, room creation and client routing

pub mod queue;
pub mod service;

pub use service::{MatchmakingError, MatchmakingService};
