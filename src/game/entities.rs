//! Players, units and towers of a single battle

use uuid::Uuid;

use crate::ws::protocol::{TeamSide, TowerKind, UnitType, Vec2};

use super::units::{TowerStats, UnitStats};
use super::EntityId;

/// Player state in a battle (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub team: TeamSide,

    // Elixir economy
    pub elixir: f32,
    pub max_elixir: f32,
    /// Elixir per second before multipliers
    pub elixir_regen_rate: f32,

    pub is_connected: bool,
    /// Enemy towers destroyed
    pub crowns: u32,
}

impl Player {
    pub fn new(
        id: Uuid,
        name: String,
        team: TeamSide,
        initial_elixir: f32,
        max_elixir: f32,
        elixir_regen_rate: f32,
    ) -> Self {
        Self {
            id,
            name,
            team,
            elixir: initial_elixir.clamp(0.0, max_elixir),
            max_elixir,
            elixir_regen_rate,
            is_connected: true,
            crowns: 0,
        }
    }

    /// Add elixir, never exceeding the cap
    pub fn regenerate(&mut self, amount: f32) {
        self.elixir = (self.elixir + amount).min(self.max_elixir);
    }

    /// Deduct elixir if the player can afford it
    pub fn spend(&mut self, cost: f32) -> bool {
        if self.elixir < cost {
            return false;
        }
        self.elixir = (self.elixir - cost).max(0.0);
        true
    }
}

/// A deployed unit
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: EntityId,
    pub unit_type: UnitType,
    pub team: TeamSide,
    pub position: Vec2,
    /// May drop below zero before the end-of-tick death sweep
    pub health: f32,
    pub max_health: f32,
    pub target: Option<EntityId>,
    /// Game time of the last attack, `None` until the first one
    pub last_attack_time: Option<f32>,
    pub stats: UnitStats,
    pub alive: bool,
    /// Game time of placement, in seconds
    pub deployed_at: f32,
}

impl Unit {
    pub fn new(
        id: EntityId,
        unit_type: UnitType,
        team: TeamSide,
        position: Vec2,
        stats: UnitStats,
        deployed_at: f32,
    ) -> Self {
        Self {
            id,
            unit_type,
            team,
            position,
            health: stats.health,
            max_health: stats.health,
            target: None,
            last_attack_time: None,
            stats,
            alive: true,
            deployed_at,
        }
    }
}

/// A fixed defensive structure
#[derive(Debug, Clone)]
pub struct Tower {
    pub id: EntityId,
    pub kind: TowerKind,
    pub team: TeamSide,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    pub attack_speed: f32,
    pub attack_range: f32,
    pub last_attack_time: Option<f32>,
    /// Terminal once set
    pub is_destroyed: bool,
}

impl Tower {
    pub fn new(id: EntityId, kind: TowerKind, team: TeamSide, position: Vec2, stats: TowerStats) -> Self {
        Self {
            id,
            kind,
            team,
            position,
            health: stats.health,
            max_health: stats.health,
            damage: stats.damage,
            attack_speed: stats.attack_speed,
            attack_range: stats.attack_range,
            last_attack_time: None,
            is_destroyed: false,
        }
    }

    /// Stable label, e.g. `tower_left_main`
    pub fn label(&self) -> String {
        format!("tower_{}_{}", self.team.as_str(), self.kind.as_str())
    }

    pub fn attack_interval_ms(&self) -> f32 {
        1000.0 / self.attack_speed
    }
}
