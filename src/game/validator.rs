//! Anti-cheat validation of player commands

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::rate_limit::SlidingWindowLimiter;
use crate::ws::protocol::{Command, TeamSide, UnitType, Vec2};

use super::battle::BattleState;
use super::entities::Player;
use super::physics::PhysicsSystem;

/// Why a command was refused. Refused commands never mutate state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("Game is not active")]
    NotActive,

    #[error("Player is not connected")]
    NotConnected,

    #[error("Player is not part of this match")]
    UnknownPlayer,

    #[error("Command timestamp is invalid")]
    StaleTimestamp,

    #[error("Invalid unit type")]
    UnknownUnit,

    #[error("Insufficient elixir. Need {required}, have {available:.1}")]
    InsufficientElixir { required: f32, available: f32 },

    #[error("Position is out of map bounds")]
    OutOfBounds,

    #[error("Position is outside deployment zone")]
    OutsideDeploymentZone,

    #[error("Cannot deploy units at enemy base line")]
    EnemyBaseline,

    #[error("Cannot deploy unit on top of existing unit")]
    Overlap,

    #[error("Spell system not yet implemented")]
    SpellUnavailable,

    #[error("Command rate limit exceeded")]
    RateLimited,

    #[error("Too many pending commands")]
    InboxFull,
}

impl Rejection {
    /// Machine-readable reason code sent to the client
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotActive => "not_active",
            Self::NotConnected => "not_connected",
            Self::UnknownPlayer => "unknown_player",
            Self::StaleTimestamp => "invalid_timestamp",
            Self::UnknownUnit => "invalid_unit_type",
            Self::InsufficientElixir { .. } => "insufficient_elixir",
            Self::OutOfBounds => "out_of_bounds",
            Self::OutsideDeploymentZone => "outside_deployment_zone",
            Self::EnemyBaseline => "enemy_baseline",
            Self::Overlap => "overlap",
            Self::SpellUnavailable => "spell_unavailable",
            Self::RateLimited => "rate_limit",
            Self::InboxFull => "busy",
        }
    }
}

/// Validates commands against the live battle and tracks per-player
/// command rates. One instance is shared by every session of a
/// matchmaking service.
pub struct CommandValidator {
    config: Arc<GameConfig>,
    rate_limiter: SlidingWindowLimiter,
}

impl CommandValidator {
    pub fn new(config: Arc<GameConfig>) -> Self {
        let rate_limiter = SlidingWindowLimiter::new(config.command_rate_limit, config.rate_window_ms);
        Self {
            config,
            rate_limiter,
        }
    }

    /// Full validation at submission time
    pub fn validate(
        &self,
        command: &Command,
        player: &Player,
        battle: &BattleState,
        now_ms: u64,
    ) -> Result<(), Rejection> {
        Self::check_participation(player, battle)?;

        // Reject stale, skewed or replayed commands
        let skew = command.timestamp().abs_diff(now_ms);
        if skew > self.config.timestamp_tolerance_ms {
            warn!(
                player_id = %player.id,
                command_time = command.timestamp(),
                server_time = now_ms,
                difference = skew,
                "Command timestamp validation failed"
            );
            return Err(Rejection::StaleTimestamp);
        }

        self.check_command(command, player, battle)
    }

    /// Re-check a queued command against the state it is about to be
    /// applied to. Freshness was settled at submission.
    pub fn recheck(
        &self,
        command: &Command,
        player: &Player,
        battle: &BattleState,
    ) -> Result<(), Rejection> {
        Self::check_participation(player, battle)?;
        self.check_command(command, player, battle)
    }

    fn check_participation(player: &Player, battle: &BattleState) -> Result<(), Rejection> {
        if !battle.is_active() {
            return Err(Rejection::NotActive);
        }
        if !player.is_connected {
            return Err(Rejection::NotConnected);
        }
        Ok(())
    }

    fn check_command(
        &self,
        command: &Command,
        player: &Player,
        battle: &BattleState,
    ) -> Result<(), Rejection> {
        match command {
            Command::DeployUnit {
                unit_type, position, ..
            } => self.validate_deploy_unit(*unit_type, *position, player, battle),
            Command::CastSpell {
                spell_type, position, ..
            } => self.validate_cast_spell(spell_type, *position, player),
            Command::Surrender { .. } => Ok(()),
        }
    }

    fn validate_deploy_unit(
        &self,
        unit_type: UnitType,
        position: Vec2,
        player: &Player,
        battle: &BattleState,
    ) -> Result<(), Rejection> {
        let stats = self.config.units.get(unit_type).ok_or(Rejection::UnknownUnit)?;

        if player.elixir < stats.elixir_cost {
            return Err(Rejection::InsufficientElixir {
                required: stats.elixir_cost,
                available: player.elixir,
            });
        }

        self.validate_deployment_position(position, player.team)?;

        if self.overlaps_living_unit(position, battle) {
            return Err(Rejection::Overlap);
        }

        Ok(())
    }

    /// Spells are not part of the game yet; every cast is refused
    fn validate_cast_spell(
        &self,
        _spell_type: &str,
        _position: Vec2,
        _player: &Player,
    ) -> Result<(), Rejection> {
        Err(Rejection::SpellUnavailable)
    }

    fn validate_deployment_position(&self, position: Vec2, team: TeamSide) -> Result<(), Rejection> {
        if !PhysicsSystem::in_bounds(position, &self.config) {
            return Err(Rejection::OutOfBounds);
        }
        if !PhysicsSystem::in_deployment_band(position, team, &self.config) {
            return Err(Rejection::OutsideDeploymentZone);
        }
        // Anti-cheese: never next to the enemy base line
        if PhysicsSystem::on_enemy_baseline(position, team, &self.config) {
            return Err(Rejection::EnemyBaseline);
        }
        Ok(())
    }

    fn overlaps_living_unit(&self, position: Vec2, battle: &BattleState) -> bool {
        battle
            .units()
            .filter(|u| u.alive)
            .any(|u| u.position.distance(&position) < self.config.overlap_radius)
    }

    /// Compare a client-reported elixir value with the server's.
    /// Advisory only: a mismatch is logged, never enforced.
    pub fn validate_player_state(player: &Player, reported_elixir: f32, tolerance: f32) -> bool {
        let difference = (player.elixir - reported_elixir).abs();
        if difference > tolerance {
            warn!(
                player_id = %player.id,
                reported_elixir,
                server_elixir = player.elixir,
                difference,
                "Player elixir mismatch detected"
            );
            return false;
        }
        true
    }

    /// Rate-limit gate, independent of command validation
    pub fn check_rate_limit_at(&self, player_id: Uuid, now_ms: u64) -> Result<(), Rejection> {
        if self.rate_limiter.check_at(player_id, now_ms) {
            Ok(())
        } else {
            warn!(
                player_id = %player_id,
                limit = self.config.command_rate_limit,
                "Rate limit exceeded"
            );
            Err(Rejection::RateLimited)
        }
    }

    /// Forget rate windows of players that have gone quiet
    pub fn prune_rate_windows(&self, now_ms: u64) -> usize {
        self.rate_limiter
            .prune_idle(now_ms, self.config.rate_idle_expiry_ms)
    }
}
