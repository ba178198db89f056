//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Point on the battle map, in map units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Side of the arena a player defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    Left,
    Right,
}

impl TeamSide {
    pub fn opponent(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Deployable unit archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Sturdy melee fighter
    Knight,
    /// Fragile ranged attacker
    Archer,
    /// Ranged heavy hitter
    Wizard,
    /// Slow, very tanky
    Giant,
    /// Cheap and fast
    Goblin,
    /// Expensive flying bruiser
    Dragon,
    /// Any archetype this server does not know; never deployable
    #[serde(other)]
    Unknown,
}

/// Tower slot within a team's defences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    Main,
    Left,
    Right,
}

impl TowerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Why a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    TowersDestroyed,
    TimeLimit,
    Surrender,
    Disconnect,
}

/// In-match command issued by a player. Never trusted until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Spend elixir to place a unit
    DeployUnit {
        unit_type: UnitType,
        position: Vec2,
        /// Client clock, unix milliseconds
        timestamp: u64,
    },

    /// Reserved for the spell system
    CastSpell {
        spell_type: String,
        position: Vec2,
        timestamp: u64,
    },

    /// Concede the match
    Surrender { timestamp: u64 },
}

impl Command {
    /// Client-asserted send time
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::DeployUnit { timestamp, .. }
            | Self::CastSpell { timestamp, .. }
            | Self::Surrender { timestamp } => *timestamp,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeployUnit { .. } => "deploy_unit",
            Self::CastSpell { .. } => "cast_spell",
            Self::Surrender { .. } => "surrender",
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Enter the matchmaking queue
    JoinQueue {
        #[serde(default)]
        name: Option<String>,
    },

    /// Leave the matchmaking queue
    LeaveQueue,

    /// In-match command
    Command { command: Command },

    /// Client's view of its own elixir, checked for drift
    ElixirReport { elixir: f32 },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome { client_id: Uuid, server_time: u64 },

    /// Entered the matchmaking queue
    QueueJoined {
        player_id: Uuid,
        queue_position: usize,
    },

    /// Removed from the matchmaking queue
    QueueLeft,

    /// Placed into a match
    MatchFound {
        room_id: Uuid,
        player_id: Uuid,
        team: TeamSide,
        opponent: Option<OpponentSummary>,
    },

    /// Per-player projection, sent every tick
    StateUpdate { state: ClientGameState },

    /// A command was refused and had no effect
    CommandRejected { code: String, message: String },

    /// Match is over
    MatchEnded {
        winner: TeamSide,
        reason: EndReason,
        final_state: Option<ClientGameState>,
    },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Who a player is matched against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentSummary {
    pub player_id: Uuid,
    pub name: String,
    pub team: TeamSide,
}

/// Player as seen in a state update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: Uuid,
    pub name: String,
    pub team: TeamSide,
    pub elixir: f32,
    pub max_elixir: f32,
    pub is_connected: bool,
    pub crowns: u32,
}

/// Living unit in a state update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitView {
    pub id: u64,
    pub unit_type: UnitType,
    pub team: TeamSide,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub target: Option<u64>,
    /// Game seconds at placement
    pub deployed_at: f32,
    pub deploy_time_ms: u32,
}

/// Tower in a state update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerView {
    pub id: u64,
    pub kind: TowerKind,
    pub team: TeamSide,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub is_destroyed: bool,
}

/// Read-only projection of a match for one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientGameState {
    pub room_id: Uuid,
    pub players: Vec<PlayerView>,
    pub units: Vec<UnitView>,
    pub towers: Vec<TowerView>,
    /// Elapsed simulated milliseconds
    pub game_time: f32,
    pub is_active: bool,
    pub winner: Option<TeamSide>,
    pub your_team: TeamSide,
    pub your_elixir: f32,
}
