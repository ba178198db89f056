//! Static stat tables for units and towers

use std::collections::HashMap;

use crate::ws::protocol::{TowerKind, UnitType};

/// Stats for one unit archetype
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    pub health: f32,
    pub damage: f32,
    /// Attacks per second
    pub attack_speed: f32,
    /// Map units per second
    pub move_speed: f32,
    pub attack_range: f32,
    pub elixir_cost: f32,
    /// Length of the deploy animation clients play. Units act from the
    /// tick they are placed.
    pub deploy_time_ms: u32,
}

impl UnitStats {
    /// Stock stats of a known archetype
    pub fn for_type(unit_type: UnitType) -> Option<Self> {
        let stats = match unit_type {
            UnitType::Knight => Self {
                health: 1000.0,
                damage: 150.0,
                attack_speed: 1.2,
                move_speed: 1.0,
                attack_range: 1.5,
                elixir_cost: 3.0,
                deploy_time_ms: 1000,
            },
            UnitType::Archer => Self {
                health: 400.0,
                damage: 100.0,
                attack_speed: 1.0,
                move_speed: 1.2,
                attack_range: 5.0,
                elixir_cost: 2.0,
                deploy_time_ms: 1000,
            },
            UnitType::Wizard => Self {
                health: 600.0,
                damage: 200.0,
                attack_speed: 1.5,
                move_speed: 0.8,
                attack_range: 4.5,
                elixir_cost: 4.0,
                deploy_time_ms: 1000,
            },
            UnitType::Giant => Self {
                health: 3000.0,
                damage: 250.0,
                attack_speed: 2.0,
                move_speed: 0.6,
                attack_range: 1.5,
                elixir_cost: 5.0,
                deploy_time_ms: 1500,
            },
            UnitType::Goblin => Self {
                health: 200.0,
                damage: 80.0,
                attack_speed: 0.8,
                move_speed: 2.0,
                attack_range: 1.0,
                elixir_cost: 1.0,
                deploy_time_ms: 500,
            },
            UnitType::Dragon => Self {
                health: 2000.0,
                damage: 300.0,
                attack_speed: 1.8,
                move_speed: 1.5,
                attack_range: 3.5,
                elixir_cost: 7.0,
                deploy_time_ms: 2000,
            },
            UnitType::Unknown => return None,
        };
        Some(stats)
    }

    /// Minimum milliseconds between two attacks
    pub fn attack_interval_ms(&self) -> f32 {
        1000.0 / self.attack_speed
    }
}

/// Archetypes enabled for play. A unit type missing here cannot be deployed.
#[derive(Debug, Clone)]
pub struct UnitCatalog {
    stats: HashMap<UnitType, UnitStats>,
}

impl UnitCatalog {
    pub fn empty() -> Self {
        Self {
            stats: HashMap::new(),
        }
    }

    pub fn get(&self, unit_type: UnitType) -> Option<&UnitStats> {
        self.stats.get(&unit_type)
    }

    pub fn insert(&mut self, unit_type: UnitType, stats: UnitStats) {
        self.stats.insert(unit_type, stats);
    }

    #[cfg(test)]
    pub fn remove(&mut self, unit_type: UnitType) -> Option<UnitStats> {
        self.stats.remove(&unit_type)
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        for unit_type in [
            UnitType::Knight,
            UnitType::Archer,
            UnitType::Wizard,
            UnitType::Giant,
            UnitType::Goblin,
            UnitType::Dragon,
        ] {
            if let Some(stats) = UnitStats::for_type(unit_type) {
                catalog.insert(unit_type, stats);
            }
        }
        catalog
    }
}

/// Stats for a fixed tower
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowerStats {
    pub health: f32,
    pub damage: f32,
    pub attack_speed: f32,
    pub attack_range: f32,
}

impl TowerStats {
    pub fn main() -> Self {
        Self {
            health: 4000.0,
            damage: 150.0,
            attack_speed: 1.0,
            attack_range: 7.0,
        }
    }

    pub fn side() -> Self {
        Self {
            health: 2500.0,
            damage: 100.0,
            attack_speed: 0.8,
            attack_range: 6.0,
        }
    }

    pub fn for_kind(kind: TowerKind, main: &Self, side: &Self) -> Self {
        match kind {
            TowerKind::Main => *main,
            TowerKind::Left | TowerKind::Right => *side,
        }
    }
}
