//! Per-player projections of the battle for network transmission

use crate::ws::protocol::{ClientGameState, PlayerView, TowerView, UnitView};

use super::battle::BattleState;
use super::entities::{Player, Tower, Unit};

/// Builds the outbound view of a battle
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Projection of `battle` as seen by `viewer`
    pub fn build(battle: &BattleState, viewer: &Player) -> ClientGameState {
        ClientGameState {
            room_id: battle.room_id(),
            players: battle.players().iter().map(Self::player_view).collect(),
            units: battle
                .units()
                .filter(|u| u.alive)
                .map(Self::unit_view)
                .collect(),
            towers: battle.towers().iter().map(Self::tower_view).collect(),
            game_time: battle.game_time(),
            is_active: battle.is_active(),
            winner: battle.winner(),
            your_team: viewer.team,
            your_elixir: viewer.elixir,
        }
    }

    fn player_view(p: &Player) -> PlayerView {
        PlayerView {
            id: p.id,
            name: p.name.clone(),
            team: p.team,
            elixir: p.elixir,
            max_elixir: p.max_elixir,
            is_connected: p.is_connected,
            crowns: p.crowns,
        }
    }

    fn unit_view(u: &Unit) -> UnitView {
        UnitView {
            id: u.id,
            unit_type: u.unit_type,
            team: u.team,
            position: u.position,
            health: u.health,
            max_health: u.max_health,
            target: u.target,
            deployed_at: u.deployed_at,
            deploy_time_ms: u.stats.deploy_time_ms,
        }
    }

    fn tower_view(t: &Tower) -> TowerView {
        TowerView {
            id: t.id,
            kind: t.kind,
            team: t.team,
            position: t.position,
            health: t.health,
            max_health: t.max_health,
            is_destroyed: t.is_destroyed,
        }
    }
}
