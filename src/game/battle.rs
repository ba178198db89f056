//! Authoritative battle simulation for one match

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::{ClientGameState, EndReason, TeamSide, TowerKind, Vec2};

use super::combat::{CombatSystem, NearestTarget};
use super::entities::{Player, Tower, Unit};
use super::physics::PhysicsSystem;
use super::snapshot::SnapshotBuilder;
use super::units::TowerStats;
use super::EntityId;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Waiting for the roster to fill
    Waiting,
    /// Simulation running
    Active,
    /// Winner decided, state frozen
    Ended,
}

/// How a finished match was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winner: TeamSide,
    pub reason: EndReason,
}

/// Battle lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("Player {0} is not part of this match")]
    PlayerNotFound(Uuid),
}

/// World state of one match: players, units, towers and the clock
pub struct BattleState {
    room_id: Uuid,
    config: Arc<GameConfig>,
    phase: MatchPhase,
    /// Elapsed simulated milliseconds
    game_time: f32,
    players: Vec<Player>,
    /// Keyed by id, so iteration follows deployment order
    units: BTreeMap<EntityId, Unit>,
    towers: Vec<Tower>,
    outcome: Option<MatchOutcome>,
    next_entity_id: EntityId,
    last_update: Option<Instant>,
}

impl BattleState {
    pub fn new(room_id: Uuid, config: Arc<GameConfig>) -> Self {
        let mut battle = Self {
            room_id,
            config,
            phase: MatchPhase::Waiting,
            game_time: 0.0,
            players: Vec::with_capacity(2),
            units: BTreeMap::new(),
            towers: Vec::with_capacity(6),
            outcome: None,
            next_entity_id: 1,
            last_update: None,
        };
        battle.initialize_towers();
        battle
    }

    /// Place the three towers of each team from the map geometry
    fn initialize_towers(&mut self) {
        let w = self.config.map_width;
        let h = self.config.map_height;

        let layout = [
            (TeamSide::Left, TowerKind::Main, Vec2::new(2.0, h / 2.0)),
            (TeamSide::Left, TowerKind::Left, Vec2::new(4.0, h / 4.0)),
            (TeamSide::Left, TowerKind::Right, Vec2::new(4.0, 3.0 * h / 4.0)),
            (TeamSide::Right, TowerKind::Main, Vec2::new(w - 2.0, h / 2.0)),
            (TeamSide::Right, TowerKind::Left, Vec2::new(w - 4.0, h / 4.0)),
            (TeamSide::Right, TowerKind::Right, Vec2::new(w - 4.0, 3.0 * h / 4.0)),
        ];

        for (team, kind, position) in layout {
            let stats = TowerStats::for_kind(kind, &self.config.main_tower, &self.config.side_tower);
            let id = self.allocate_id();
            self.towers.push(Tower::new(id, kind, team, position, stats));
        }
    }

    /// Reserve the next entity id
    pub fn allocate_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Register a player with the match
    pub fn add_player(&mut self, player: Player) {
        info!(
            room_id = %self.room_id,
            player_id = %player.id,
            team = player.team.as_str(),
            "Player added to battle"
        );
        self.players.push(player);
    }

    /// Mark a player as disconnected; their units stay on the field
    pub fn disconnect_player(&mut self, player_id: Uuid) {
        if let Some(player) = self.player_mut(player_id) {
            player.is_connected = false;
            info!(player_id = %player_id, "Player disconnected from battle");
        }
    }

    /// Begin the simulation. Only valid from `Waiting`.
    pub fn start(&mut self) -> bool {
        if self.phase != MatchPhase::Waiting {
            return false;
        }
        self.phase = MatchPhase::Active;
        self.last_update = Some(Instant::now());
        info!(room_id = %self.room_id, "Battle started");
        true
    }

    /// Finish the match. Only the first call while active has any effect.
    pub fn end(&mut self, winner: TeamSide, reason: EndReason) -> bool {
        if self.phase != MatchPhase::Active {
            return false;
        }
        self.phase = MatchPhase::Ended;
        self.outcome = Some(MatchOutcome { winner, reason });
        info!(
            room_id = %self.room_id,
            winner = winner.as_str(),
            reason = ?reason,
            game_time = self.game_time,
            "Battle ended"
        );
        true
    }

    /// Add a unit to the field
    pub fn add_unit(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Run one simulation step of `delta_ms` milliseconds
    pub fn advance(&mut self, delta_ms: f32) {
        if self.phase != MatchPhase::Active {
            return;
        }

        let delta_ms = delta_ms.max(0.0);
        self.game_time = (self.game_time + delta_ms).min(self.config.max_game_time_ms);
        self.last_update = Some(Instant::now());

        self.regenerate_elixir(delta_ms);
        self.update_units(delta_ms);
        self.update_towers();
        self.sweep_dead_units();
        self.resolve_tower_destruction();
        self.check_win_conditions();
    }

    fn regenerate_elixir(&mut self, delta_ms: f32) {
        let multiplier = if self.game_time >= self.config.double_elixir_time_ms {
            2.0
        } else {
            1.0
        };

        for player in self.players.iter_mut().filter(|p| p.is_connected) {
            let gain = player.elixir_regen_rate * multiplier * delta_ms / 1000.0;
            player.regenerate(gain);
        }
    }

    fn update_units(&mut self, delta_ms: f32) {
        let now = self.game_time;
        let ids: Vec<EntityId> = self.units.keys().copied().collect();

        for id in ids {
            let (team, position, current_target, stats, last_attack) = match self.units.get(&id) {
                Some(unit) if unit.alive => (
                    unit.team,
                    unit.position,
                    unit.target,
                    unit.stats,
                    unit.last_attack_time,
                ),
                _ => continue,
            };

            let target = current_target.or_else(|| self.find_unit_target(team, position));
            let resolved = target.and_then(|t| self.target_position(t).map(|pos| (t, pos)));

            let Some((target_id, target_pos)) = resolved else {
                if let Some(unit) = self.units.get_mut(&id) {
                    unit.target = None;
                }
                continue;
            };

            let mut fired = false;
            if position.distance(&target_pos) <= stats.attack_range {
                if CombatSystem::can_attack(last_attack, now, stats.attack_interval_ms()) {
                    self.damage_entity(target_id, stats.damage);
                    fired = true;
                    debug!(attacker = id, target = target_id, damage = stats.damage, "Unit attacked");
                }
            }

            if let Some(unit) = self.units.get_mut(&id) {
                unit.target = Some(target_id);
                if fired {
                    unit.last_attack_time = Some(now);
                } else if position.distance(&target_pos) > stats.attack_range {
                    unit.position =
                        PhysicsSystem::move_towards(position, target_pos, stats.move_speed, delta_ms);
                }
            }
        }
    }

    fn update_towers(&mut self) {
        let now = self.game_time;

        for idx in 0..self.towers.len() {
            let tower = &self.towers[idx];
            if tower.is_destroyed {
                continue;
            }

            let enemy = tower.team.opponent();
            let mut nearest = NearestTarget::new();
            for unit in self.units.values().filter(|u| u.alive && u.team == enemy) {
                let distance = tower.position.distance(&unit.position);
                if distance <= tower.attack_range {
                    nearest.offer(unit.id, distance);
                }
            }

            let Some(target_id) = nearest.id() else {
                continue;
            };

            if !CombatSystem::can_attack(tower.last_attack_time, now, tower.attack_interval_ms()) {
                continue;
            }

            let damage = tower.damage;
            let tower_id = tower.id;
            if let Some(unit) = self.units.get_mut(&target_id) {
                unit.health = CombatSystem::apply_damage(unit.health, damage);
            }
            self.towers[idx].last_attack_time = Some(now);
            debug!(tower = tower_id, target = target_id, damage, "Tower attacked unit");
        }
    }

    /// Remove units that ended the tick at or below zero health
    fn sweep_dead_units(&mut self) {
        for unit in self.units.values_mut() {
            if unit.alive && unit.health <= 0.0 {
                unit.alive = false;
                debug!(unit_id = unit.id, unit_type = ?unit.unit_type, team = unit.team.as_str(), "Unit destroyed");
            }
        }
        self.units.retain(|_, unit| unit.alive);
    }

    fn resolve_tower_destruction(&mut self) {
        for idx in 0..self.towers.len() {
            let tower = &mut self.towers[idx];
            if tower.is_destroyed || tower.health > 0.0 {
                continue;
            }

            tower.is_destroyed = true;
            let team = tower.team;
            let label = tower.label();

            if let Some(player) = self.players.iter_mut().find(|p| p.team == team.opponent()) {
                player.crowns += 1;
            }

            info!(room_id = %self.room_id, tower = %label, "Tower destroyed");
        }
    }

    fn check_win_conditions(&mut self) {
        if self.main_tower_destroyed(TeamSide::Left) {
            self.end(TeamSide::Right, EndReason::TowersDestroyed);
            return;
        }
        if self.main_tower_destroyed(TeamSide::Right) {
            self.end(TeamSide::Left, EndReason::TowersDestroyed);
            return;
        }

        if self.game_time >= self.config.max_game_time_ms {
            let winner = self.time_limit_winner();
            self.end(winner, EndReason::TimeLimit);
        }
    }

    /// Crowns first, then remaining tower health. A complete tie goes to the
    /// right side.
    fn time_limit_winner(&self) -> TeamSide {
        let left_crowns = self.crowns(TeamSide::Left);
        let right_crowns = self.crowns(TeamSide::Right);
        if left_crowns != right_crowns {
            return if left_crowns > right_crowns {
                TeamSide::Left
            } else {
                TeamSide::Right
            };
        }

        if self.total_tower_health(TeamSide::Left) > self.total_tower_health(TeamSide::Right) {
            TeamSide::Left
        } else {
            TeamSide::Right
        }
    }

    fn main_tower_destroyed(&self, team: TeamSide) -> bool {
        self.towers
            .iter()
            .any(|t| t.team == team && t.kind == TowerKind::Main && t.is_destroyed)
    }

    fn find_unit_target(&self, team: TeamSide, position: Vec2) -> Option<EntityId> {
        let enemy = team.opponent();
        let mut nearest = NearestTarget::new();

        for unit in self.units.values().filter(|u| u.alive && u.team == enemy) {
            nearest.offer(unit.id, position.distance(&unit.position));
        }
        for tower in self.towers.iter().filter(|t| !t.is_destroyed && t.team == enemy) {
            nearest.offer(tower.id, position.distance(&tower.position));
        }

        nearest.id()
    }

    /// Current position of a live unit or standing tower
    fn target_position(&self, id: EntityId) -> Option<Vec2> {
        if let Some(unit) = self.units.get(&id) {
            return unit.alive.then_some(unit.position);
        }
        self.towers
            .iter()
            .find(|t| t.id == id && !t.is_destroyed)
            .map(|t| t.position)
    }

    fn damage_entity(&mut self, id: EntityId, damage: f32) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.health = CombatSystem::apply_damage(unit.health, damage);
        } else if let Some(tower) = self.towers.iter_mut().find(|t| t.id == id) {
            tower.health = CombatSystem::apply_damage(tower.health, damage);
        }
    }

    /// Crowns held by whoever plays `team`
    pub fn crowns(&self, team: TeamSide) -> u32 {
        self.players
            .iter()
            .filter(|p| p.team == team)
            .map(|p| p.crowns)
            .sum()
    }

    /// Summed health of `team`'s standing towers
    pub fn total_tower_health(&self, team: TeamSide) -> f32 {
        self.towers
            .iter()
            .filter(|t| t.team == team && !t.is_destroyed)
            .map(|t| t.health)
            .sum()
    }

    /// Per-player read-only projection
    pub fn serialize(&self, player_id: Uuid) -> Result<ClientGameState, BattleError> {
        let viewer = self
            .player(player_id)
            .ok_or(BattleError::PlayerNotFound(player_id))?;
        Ok(SnapshotBuilder::build(self, viewer))
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    #[cfg(test)]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == MatchPhase::Active
    }

    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    pub fn winner(&self) -> Option<TeamSide> {
        self.outcome.map(|o| o.winner)
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    #[cfg(test)]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    /// Wall-clock instant of the last simulation step
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::units::UnitStats;
    use crate::ws::protocol::UnitType;

    const EPS: f32 = 1e-3;

    fn battle_with(config: GameConfig) -> (BattleState, Uuid, Uuid) {
        let config = Arc::new(config);
        let mut battle = BattleState::new(Uuid::new_v4(), config.clone());
        let left = Uuid::new_v4();
        let right = Uuid::new_v4();
        for (id, team) in [(left, TeamSide::Left), (right, TeamSide::Right)] {
            battle.add_player(Player::new(
                id,
                format!("{:?}", team),
                team,
                config.initial_elixir,
                config.max_elixir,
                config.elixir_regen_rate,
            ));
        }
        assert!(battle.start());
        (battle, left, right)
    }

    fn started_battle() -> (BattleState, Uuid, Uuid) {
        battle_with(GameConfig::default())
    }

    fn spawn(battle: &mut BattleState, unit_type: UnitType, team: TeamSide, x: f32, y: f32) -> EntityId {
        let id = battle.allocate_id();
        let stats = UnitStats::for_type(unit_type).unwrap();
        let time = battle.game_time();
        battle.add_unit(Unit::new(id, unit_type, team, Vec2::new(x, y), stats, time));
        id
    }

    fn tower_mut(battle: &mut BattleState, team: TeamSide, kind: TowerKind) -> &mut Tower {
        battle
            .towers
            .iter_mut()
            .find(|t| t.team == team && t.kind == kind)
            .unwrap()
    }

    #[test]
    fn towers_follow_map_geometry() {
        let (battle, _, _) = started_battle();
        assert_eq!(battle.towers().len(), 6);

        let left_main = battle
            .towers()
            .iter()
            .find(|t| t.team == TeamSide::Left && t.kind == TowerKind::Main)
            .unwrap();
        assert_eq!(left_main.position, Vec2::new(2.0, 16.0));
        assert_eq!(left_main.health, 4000.0);

        let right_side = battle
            .towers()
            .iter()
            .find(|t| t.team == TeamSide::Right && t.kind == TowerKind::Right)
            .unwrap();
        assert_eq!(right_side.position, Vec2::new(14.0, 24.0));
        assert_eq!(right_side.health, 2500.0);
    }

    #[test]
    fn advance_is_noop_before_start() {
        let mut battle = BattleState::new(Uuid::new_v4(), Arc::new(GameConfig::default()));
        battle.advance(50.0);
        assert_eq!(battle.game_time(), 0.0);
        assert_eq!(battle.phase(), MatchPhase::Waiting);
    }

    #[test]
    fn elixir_regenerates_and_caps() {
        let (mut battle, left, _) = started_battle();
        battle.advance(1000.0);
        assert!((battle.player(left).unwrap().elixir - 6.0).abs() < EPS);

        for _ in 0..200 {
            battle.advance(50.0);
        }
        assert!(battle.player(left).unwrap().elixir <= 10.0);
        assert!((battle.player(left).unwrap().elixir - 10.0).abs() < EPS);
    }

    #[test]
    fn elixir_doubles_after_threshold() {
        let (mut battle, left, _) = battle_with(GameConfig {
            double_elixir_time_ms: 0.0,
            ..GameConfig::default()
        });
        battle.advance(1000.0);
        assert!((battle.player(left).unwrap().elixir - 7.0).abs() < EPS);
    }

    #[test]
    fn disconnected_players_do_not_regenerate() {
        let (mut battle, left, right) = started_battle();
        battle.disconnect_player(left);
        battle.advance(1000.0);
        assert!((battle.player(left).unwrap().elixir - 5.0).abs() < EPS);
        assert!((battle.player(right).unwrap().elixir - 6.0).abs() < EPS);
    }

    #[test]
    fn unit_targets_nearest_enemy_and_walks_toward_it() {
        let (mut battle, _, _) = started_battle();
        let knight = spawn(&mut battle, UnitType::Knight, TeamSide::Left, 2.0, 2.0);
        let goblin = spawn(&mut battle, UnitType::Goblin, TeamSide::Right, 9.0, 2.0);

        battle.advance(1000.0);

        let unit = battle.unit(knight).unwrap();
        assert_eq!(unit.target, Some(goblin));
        // Knight moves 1 unit/s toward the goblin
        assert!((unit.position.x - 3.0).abs() < EPS);
        assert!((unit.position.y - 2.0).abs() < EPS);
    }

    #[test]
    fn towers_compete_with_units_for_nearest_target() {
        let (mut battle, _, _) = started_battle();
        // Closer to the right side tower at (14, 8) than to the far goblin
        let archer = spawn(&mut battle, UnitType::Archer, TeamSide::Left, 12.0, 8.0);
        spawn(&mut battle, UnitType::Goblin, TeamSide::Right, 1.0, 30.0);

        battle.advance(50.0);

        let tower_id = battle
            .towers()
            .iter()
            .find(|t| t.team == TeamSide::Right && t.kind == TowerKind::Left)
            .unwrap()
            .id;
        assert_eq!(battle.unit(archer).unwrap().target, Some(tower_id));
    }

    #[test]
    fn attacks_respect_cooldown() {
        let (mut battle, _, _) = started_battle();
        spawn(&mut battle, UnitType::Knight, TeamSide::Left, 9.0, 2.0);
        let giant = spawn(&mut battle, UnitType::Giant, TeamSide::Right, 10.0, 2.0);

        // Attacks land at t=50 and t=900 (interval 833ms)
        for _ in 0..20 {
            battle.advance(50.0);
        }
        assert!((battle.unit(giant).unwrap().health - 2700.0).abs() < EPS);
    }

    #[test]
    fn lethal_exchange_removes_both_units_at_end_of_tick() {
        let (mut battle, _, _) = started_battle();
        let left = spawn(&mut battle, UnitType::Knight, TeamSide::Left, 9.0, 2.0);
        let right = spawn(&mut battle, UnitType::Knight, TeamSide::Right, 9.5, 2.0);
        battle.units.get_mut(&left).unwrap().health = 100.0;
        battle.units.get_mut(&right).unwrap().health = 100.0;

        battle.advance(50.0);

        // The right knight was already at lethal damage but still struck back
        assert!(battle.unit(left).is_none());
        assert!(battle.unit(right).is_none());
    }

    #[test]
    fn cleared_target_is_reacquired() {
        let (mut battle, _, _) = started_battle();
        let knight = spawn(&mut battle, UnitType::Knight, TeamSide::Left, 9.0, 2.0);
        let goblin = spawn(&mut battle, UnitType::Goblin, TeamSide::Right, 9.5, 2.0);
        battle.units.get_mut(&goblin).unwrap().health = 10.0;

        battle.advance(50.0);
        assert!(battle.unit(goblin).is_none());
        assert_eq!(battle.unit(knight).unwrap().target, Some(goblin));

        // Stale target is dropped, then a tower is picked up
        battle.advance(50.0);
        assert_eq!(battle.unit(knight).unwrap().target, None);
        battle.advance(50.0);
        assert!(battle.unit(knight).unwrap().target.is_some());
    }

    #[test]
    fn tower_shoots_units_in_range() {
        let (mut battle, _, _) = started_battle();
        // Left side tower at (4, 8) with range 6
        let goblin = spawn(&mut battle, UnitType::Goblin, TeamSide::Right, 6.0, 8.0);
        battle.advance(50.0);
        assert!((battle.unit(goblin).unwrap().health - 100.0).abs() < EPS);
    }

    #[test]
    fn tower_destruction_awards_one_crown() {
        let (mut battle, left, right) = started_battle();
        tower_mut(&mut battle, TeamSide::Right, TowerKind::Left).health = 0.0;

        battle.advance(50.0);
        battle.advance(50.0);
        tower_mut(&mut battle, TeamSide::Right, TowerKind::Left).health = -500.0;
        battle.advance(50.0);

        assert_eq!(battle.player(left).unwrap().crowns, 1);
        assert_eq!(battle.player(right).unwrap().crowns, 0);
        assert!(battle.is_active());
    }

    #[test]
    fn main_tower_loss_ends_match_same_tick() {
        let (mut battle, _, _) = started_battle();
        tower_mut(&mut battle, TeamSide::Left, TowerKind::Main).health = -1.0;

        battle.advance(50.0);

        assert_eq!(battle.phase(), MatchPhase::Ended);
        assert_eq!(
            battle.outcome(),
            Some(MatchOutcome {
                winner: TeamSide::Right,
                reason: EndReason::TowersDestroyed,
            })
        );
    }

    #[test]
    fn game_time_is_monotonic_and_frozen_after_end() {
        let (mut battle, _, _) = battle_with(GameConfig {
            max_game_time_ms: 500.0,
            ..GameConfig::default()
        });

        let mut last = battle.game_time();
        for _ in 0..20 {
            battle.advance(50.0);
            assert!(battle.game_time() >= last);
            last = battle.game_time();
        }

        assert!(!battle.is_active());
        assert_eq!(battle.game_time(), 500.0);
        battle.advance(50.0);
        assert_eq!(battle.game_time(), 500.0);
    }

    #[test]
    fn time_limit_prefers_crowns() {
        let (mut battle, _, right) = battle_with(GameConfig {
            max_game_time_ms: 100.0,
            ..GameConfig::default()
        });
        battle.player_mut(right).unwrap().crowns = 1;
        tower_mut(&mut battle, TeamSide::Left, TowerKind::Left).health = 100.0;
        tower_mut(&mut battle, TeamSide::Right, TowerKind::Left).health = 1.0;

        battle.advance(100.0);

        assert_eq!(battle.winner(), Some(TeamSide::Right));
        assert_eq!(battle.outcome().unwrap().reason, EndReason::TimeLimit);
    }

    #[test]
    fn time_limit_crown_tie_uses_tower_health() {
        let (mut battle, _, _) = battle_with(GameConfig {
            max_game_time_ms: 100.0,
            ..GameConfig::default()
        });
        tower_mut(&mut battle, TeamSide::Right, TowerKind::Main).health = 3000.0;

        battle.advance(100.0);

        assert_eq!(battle.winner(), Some(TeamSide::Left));
    }

    #[test]
    fn time_limit_exact_tie_goes_right() {
        let (mut battle, _, _) = battle_with(GameConfig {
            max_game_time_ms: 100.0,
            ..GameConfig::default()
        });
        battle.advance(100.0);
        assert_eq!(battle.winner(), Some(TeamSide::Right));
    }

    #[test]
    fn end_only_takes_effect_once() {
        let (mut battle, _, _) = started_battle();
        assert!(battle.end(TeamSide::Left, EndReason::Surrender));
        assert!(!battle.end(TeamSide::Right, EndReason::Disconnect));
        assert_eq!(battle.winner(), Some(TeamSide::Left));
    }

    #[test]
    fn serialize_unknown_player_fails() {
        let (battle, _, _) = started_battle();
        let stranger = Uuid::new_v4();
        assert_eq!(
            battle.serialize(stranger).unwrap_err(),
            BattleError::PlayerNotFound(stranger)
        );
    }

    #[test]
    fn serialize_reports_viewer_perspective() {
        let (mut battle, _, right) = started_battle();
        spawn(&mut battle, UnitType::Archer, TeamSide::Left, 2.0, 2.0);

        let view = battle.serialize(right).unwrap();
        assert_eq!(view.your_team, TeamSide::Right);
        assert!((view.your_elixir - 5.0).abs() < EPS);
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.units.len(), 1);
        assert_eq!(view.towers.len(), 6);
        assert!(view.is_active);
        assert_eq!(view.winner, None);
    }
}
