//! One running 1v1 match: roster, command inbox and tick driver

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::periodic::PeriodicTask;
use crate::util::time::{millis_between, unix_millis};
use crate::ws::protocol::{Command, EndReason, OpponentSummary, ServerMsg, TeamSide, UnitType, Vec2};
use crate::ws::ClientHandle;

use super::battle::BattleState;
use super::entities::{Player, Unit};
use super::validator::{CommandValidator, Rejection};
use super::QueuedCommand;

/// Players per match
pub const MAX_PLAYERS: usize = 2;

/// Tolerance for client-reported elixir
const ELIXIR_TOLERANCE: f32 = 0.1;

/// Admission failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmitError {
    #[error("Room is full")]
    RoomFull,

    #[error("Room is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    Running,
    Finished,
}

/// Summary of a room for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub room_id: Uuid,
    pub players: usize,
    pub status: SessionStatus,
    pub game_time: f32,
    pub is_active: bool,
    /// Milliseconds since the last simulation step
    pub last_update_ms: Option<f32>,
    /// Commands waiting for the next tick
    pub pending_commands: usize,
}

struct RosterEntry {
    player_id: Uuid,
    client: ClientHandle,
    name: String,
    team: TeamSide,
}

impl RosterEntry {
    fn summary(&self) -> OpponentSummary {
        OpponentSummary {
            player_id: self.player_id,
            name: self.name.clone(),
            team: self.team,
        }
    }
}

struct SessionCore {
    battle: BattleState,
    roster: Vec<RosterEntry>,
    status: SessionStatus,
    last_tick: Instant,
    closed: bool,
}

impl SessionCore {
    fn client(&self, player_id: Uuid) -> Option<&ClientHandle> {
        self.roster
            .iter()
            .find(|e| e.player_id == player_id)
            .map(|e| &e.client)
    }

    fn notify_rejection(&self, player_id: Uuid, rejection: &Rejection) {
        if let Some(client) = self.client(player_id) {
            client.send(ServerMsg::CommandRejected {
                code: rejection.code().to_string(),
                message: rejection.to_string(),
            });
        }
    }

    /// Send every connected player their own projection
    fn broadcast_state(&self) {
        for entry in &self.roster {
            match self.battle.serialize(entry.player_id) {
                Ok(state) => entry.client.send(ServerMsg::StateUpdate { state }),
                Err(e) => warn!(error = %e, "Skipping state update"),
            }
        }
    }
}

/// Authoritative host of a single match.
///
/// Commands submitted between ticks only land in the inbox; the tick is
/// the sole mutator of the battle.
pub struct Session {
    id: Uuid,
    config: Arc<GameConfig>,
    validator: Arc<CommandValidator>,
    core: Mutex<SessionCore>,
    inbox: Mutex<VecDeque<QueuedCommand>>,
    driver: PeriodicTask,
}

impl Session {
    pub fn new(id: Uuid, config: Arc<GameConfig>, validator: Arc<CommandValidator>) -> Self {
        let core = SessionCore {
            battle: BattleState::new(id, config.clone()),
            roster: Vec::with_capacity(MAX_PLAYERS),
            status: SessionStatus::Waiting,
            last_tick: Instant::now(),
            closed: false,
        };

        Self {
            id,
            inbox: Mutex::new(VecDeque::with_capacity(config.inbox_capacity.min(64))),
            config,
            validator,
            core: Mutex::new(core),
            driver: PeriodicTask::new("session_tick"),
        }
    }

    /// Seat a client in the next free team slot. The match starts once the
    /// roster is full.
    pub fn admit(
        self: &Arc<Self>,
        client: ClientHandle,
        name: String,
    ) -> Result<(Uuid, TeamSide), AdmitError> {
        let mut core = self.core.lock();
        if core.closed {
            return Err(AdmitError::Closed);
        }
        if core.roster.len() >= MAX_PLAYERS {
            return Err(AdmitError::RoomFull);
        }

        let team = if core.roster.is_empty() {
            TeamSide::Left
        } else {
            TeamSide::Right
        };
        let player_id = Uuid::new_v4();

        core.battle.add_player(Player::new(
            player_id,
            name.clone(),
            team,
            self.config.initial_elixir,
            self.config.max_elixir,
            self.config.elixir_regen_rate,
        ));
        core.roster.push(RosterEntry {
            player_id,
            client,
            name,
            team,
        });

        info!(
            room_id = %self.id,
            player_id = %player_id,
            team = team.as_str(),
            "Player admitted to room"
        );

        if core.roster.len() < MAX_PLAYERS {
            return Ok((player_id, team));
        }

        for entry in &core.roster {
            let opponent = core
                .roster
                .iter()
                .find(|other| other.player_id != entry.player_id)
                .map(RosterEntry::summary);
            entry.client.send(ServerMsg::MatchFound {
                room_id: self.id,
                player_id: entry.player_id,
                team: entry.team,
                opponent,
            });
        }

        core.status = SessionStatus::Running;
        core.battle.start();
        core.last_tick = Instant::now();
        core.broadcast_state();
        drop(core);

        self.start_driver();
        Ok((player_id, team))
    }

    fn start_driver(self: &Arc<Self>) {
        let session = Arc::downgrade(self);
        let started = self.driver.start(self.config.tick_interval(), move || {
            session.upgrade().is_some_and(|s| s.tick())
        });
        if started {
            debug!(room_id = %self.id, tick_rate = self.config.tick_rate, "Tick driver started");
        }
    }

    /// Rate-limit, validate and queue a command for the next tick.
    /// A refused command is reported to the player and changes nothing.
    pub fn submit(&self, player_id: Uuid, command: Command) -> Result<(), Rejection> {
        self.submit_at(player_id, command, unix_millis())
    }

    pub fn submit_at(&self, player_id: Uuid, command: Command, now_ms: u64) -> Result<(), Rejection> {
        let core = self.core.lock();
        let kind = command.kind();

        let result = self.enqueue_command(&core, player_id, command, now_ms);
        if let Err(rejection) = &result {
            warn!(
                room_id = %self.id,
                player_id = %player_id,
                command = kind,
                reason = rejection.code(),
                "Invalid command"
            );
            core.notify_rejection(player_id, rejection);
        }
        result
    }

    fn enqueue_command(
        &self,
        core: &SessionCore,
        player_id: Uuid,
        command: Command,
        now_ms: u64,
    ) -> Result<(), Rejection> {
        self.validator.check_rate_limit_at(player_id, now_ms)?;
        if core.closed {
            return Err(Rejection::NotActive);
        }

        let player = core
            .battle
            .player(player_id)
            .ok_or(Rejection::UnknownPlayer)?;
        self.validator
            .validate(&command, player, &core.battle, now_ms)?;

        let mut inbox = self.inbox.lock();
        if inbox.len() >= self.config.inbox_capacity {
            return Err(Rejection::InboxFull);
        }
        inbox.push_back(QueuedCommand { player_id, command });
        Ok(())
    }

    /// Run one tick with the wall-clock delta since the previous one.
    /// Returns false once the match is no longer running.
    pub fn tick(&self) -> bool {
        let mut core = self.core.lock();
        let now = Instant::now();
        let delta_ms = millis_between(core.last_tick, now);
        core.last_tick = now;
        self.step(&mut core, delta_ms)
    }

    /// Run one tick with an explicit delta
    #[cfg(test)]
    pub fn tick_with_delta(&self, delta_ms: f32) -> bool {
        let mut core = self.core.lock();
        core.last_tick = Instant::now();
        self.step(&mut core, delta_ms)
    }

    fn step(&self, core: &mut SessionCore, delta_ms: f32) -> bool {
        if core.closed || core.status != SessionStatus::Running {
            return false;
        }

        let pending: Vec<QueuedCommand> = self.inbox.lock().drain(..).collect();
        for queued in pending {
            self.apply(core, queued);
        }

        core.battle.advance(delta_ms);

        if !core.battle.is_active() {
            self.finalize(core);
            return false;
        }

        core.broadcast_state();
        true
    }

    fn apply(&self, core: &mut SessionCore, queued: QueuedCommand) {
        let QueuedCommand { player_id, command } = queued;

        let Some(player) = core.battle.player(player_id) else {
            return;
        };
        let team = player.team;

        if let Err(rejection) = self.validator.recheck(&command, player, &core.battle) {
            debug!(
                room_id = %self.id,
                player_id = %player_id,
                reason = rejection.code(),
                "Queued command dropped"
            );
            core.notify_rejection(player_id, &rejection);
            return;
        }

        match command {
            Command::DeployUnit {
                unit_type, position, ..
            } => self.deploy_unit(&mut core.battle, player_id, unit_type, position),
            Command::Surrender { .. } => {
                info!(room_id = %self.id, player_id = %player_id, "Player surrendered");
                core.battle.end(team.opponent(), EndReason::Surrender);
            }
            // Refused by validation
            Command::CastSpell { .. } => {}
        }
    }

    fn deploy_unit(
        &self,
        battle: &mut BattleState,
        player_id: Uuid,
        unit_type: UnitType,
        position: Vec2,
    ) {
        let Some(stats) = self.config.units.get(unit_type).copied() else {
            return;
        };
        let Some(player) = battle.player_mut(player_id) else {
            return;
        };
        if !player.spend(stats.elixir_cost) {
            return;
        }
        let team = player.team;
        let remaining = player.elixir;

        let id = battle.allocate_id();
        let deployed_at = battle.game_time();
        battle.add_unit(Unit::new(id, unit_type, team, position, stats, deployed_at));

        info!(
            room_id = %self.id,
            player_id = %player_id,
            unit_id = id,
            unit_type = ?unit_type,
            x = position.x,
            y = position.y,
            elixir = remaining,
            "Unit deployed"
        );
    }

    /// Stop ticking and send everyone the final result. Runs once.
    fn finalize(&self, core: &mut SessionCore) {
        if core.status == SessionStatus::Finished {
            return;
        }
        core.status = SessionStatus::Finished;
        self.driver.stop();
        self.inbox.lock().clear();

        let Some(outcome) = core.battle.outcome() else {
            return;
        };

        for entry in &core.roster {
            entry.client.send(ServerMsg::MatchEnded {
                winner: outcome.winner,
                reason: outcome.reason,
                final_state: core.battle.serialize(entry.player_id).ok(),
            });
        }

        info!(
            room_id = %self.id,
            winner = outcome.winner.as_str(),
            reason = ?outcome.reason,
            game_time = core.battle.game_time(),
            "Game ended"
        );
    }

    /// Drop a player's connection. In a running match the remaining
    /// player wins immediately.
    pub fn handle_disconnect(&self, player_id: Uuid) {
        let mut core = self.core.lock();
        let Some(idx) = core.roster.iter().position(|e| e.player_id == player_id) else {
            return;
        };

        let entry = core.roster.remove(idx);
        core.battle.disconnect_player(player_id);
        info!(room_id = %self.id, player_id = %player_id, "Player left room");

        if core.battle.end(entry.team.opponent(), EndReason::Disconnect) {
            self.finalize(&mut core);
        }
    }

    /// Advisory drift check of a client-reported elixir value.
    /// `None` if the player is not in this room.
    pub fn audit_elixir(&self, player_id: Uuid, reported: f32) -> Option<bool> {
        let core = self.core.lock();
        core.battle
            .player(player_id)
            .map(|p| CommandValidator::validate_player_state(p, reported, ELIXIR_TOLERANCE))
    }

    /// Tear the room down. Safe to call repeatedly and before the match
    /// ever started.
    pub fn cleanup(&self) -> bool {
        self.driver.stop();

        let mut core = self.core.lock();
        if core.closed {
            return false;
        }
        core.closed = true;
        core.status = SessionStatus::Finished;
        core.roster.clear();
        self.inbox.lock().clear();

        info!(room_id = %self.id, "Room cleaned up");
        true
    }

    pub fn is_empty(&self) -> bool {
        self.core.lock().roster.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.status() == SessionStatus::Finished
    }

    pub fn status(&self) -> SessionStatus {
        self.core.lock().status
    }

    pub fn info(&self) -> RoomInfo {
        let core = self.core.lock();
        RoomInfo {
            room_id: self.id,
            players: core.roster.len(),
            status: core.status,
            game_time: core.battle.game_time(),
            is_active: core.battle.is_active(),
            last_update_ms: core
                .battle
                .last_update()
                .map(|at| millis_between(at, Instant::now())),
            pending_commands: self.inbox.lock().len(),
        }
    }

    /// Run `f` against the battle
    #[cfg(test)]
    pub fn with_battle<R>(&self, f: impl FnOnce(&BattleState) -> R) -> R {
        f(&self.core.lock().battle)
    }
}
