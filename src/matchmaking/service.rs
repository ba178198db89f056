//! Matchmaking service - manages queue, room creation and routing

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{GameConfig, MatchmakingConfig};
use crate::game::{CommandValidator, Rejection, RoomInfo, Session};
use crate::util::periodic::PeriodicTask;
use crate::util::time::unix_millis;
use crate::ws::protocol::{Command, ServerMsg};
use crate::ws::ClientHandle;

use super::queue::{MatchmakingQueue, PairAttempt, QueuedPlayer};

/// Matchmaking errors surfaced to the transport
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Already in a match")]
    AlreadyInMatch,

    #[error("Not in a match")]
    NotInMatch,

    #[error(transparent)]
    Rejected(#[from] Rejection),
}

impl MatchmakingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInMatch => "already_in_match",
            Self::NotInMatch => "not_in_match",
            Self::Rejected(r) => r.code(),
        }
    }
}

/// Where a connected client plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerRoute {
    pub room_id: Uuid,
    pub player_id: Uuid,
}

/// Outcome of one housekeeping pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: usize,
    pub reaped: usize,
    pub pruned: usize,
}

/// Snapshot for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct MatchmakingStats {
    pub queue_size: usize,
    pub active_rooms: usize,
    pub rooms: Vec<RoomInfo>,
}

/// Pairs waiting players into sessions and routes their traffic
pub struct MatchmakingService {
    config: Arc<GameConfig>,
    settings: MatchmakingConfig,
    queue: Mutex<MatchmakingQueue>,
    sessions: DashMap<Uuid, Arc<Session>>,
    /// Client id -> seat in a live room
    routes: DashMap<Uuid, PlayerRoute>,
    /// Shared by every room this service creates
    validator: Arc<CommandValidator>,
    sweeper: PeriodicTask,
}

impl MatchmakingService {
    pub fn new(config: Arc<GameConfig>, settings: MatchmakingConfig) -> Self {
        Self {
            validator: Arc::new(CommandValidator::new(config.clone())),
            config,
            settings,
            queue: Mutex::new(MatchmakingQueue::new()),
            sessions: DashMap::new(),
            routes: DashMap::new(),
            sweeper: PeriodicTask::new("matchmaking_sweep"),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.settings.timeout_ms)
    }

    /// Start the periodic sweep
    pub fn start(self: &Arc<Self>) -> bool {
        let service = Arc::downgrade(self);
        let period = Duration::from_millis(self.settings.cleanup_interval_ms.max(1));

        let started = self.sweeper.start(period, move || match service.upgrade() {
            Some(service) => {
                service.sweep();
                true
            }
            None => false,
        });
        if started {
            info!(interval_ms = self.settings.cleanup_interval_ms, "Matchmaking sweep started");
        }
        started
    }

    /// Join the queue, then try to pair. Returns the queue ticket id.
    pub fn enqueue(&self, client: ClientHandle, name: Option<String>) -> Result<Uuid, MatchmakingError> {
        self.enqueue_at(client, name, Instant::now())
    }

    pub fn enqueue_at(
        &self,
        client: ClientHandle,
        name: Option<String>,
        now: Instant,
    ) -> Result<Uuid, MatchmakingError> {
        if self.in_live_match(client.id()) {
            client.error("already_in_match", "Already in a match");
            return Err(MatchmakingError::AlreadyInMatch);
        }

        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Player_{}", &client.id().simple().to_string()[..8]));

        let player = QueuedPlayer::new(client.clone(), name, now);
        let player_id = player.player_id;

        let (position, queue_size) = {
            let mut queue = self.queue.lock();
            let position = queue.enqueue(player);
            (position, queue.len())
        };

        client.send(ServerMsg::QueueJoined {
            player_id,
            queue_position: position,
        });
        info!(client_id = %client.id(), player_id = %player_id, queue_size, "Player joined matchmaking queue");

        self.attempt_match_at(now);
        Ok(player_id)
    }

    /// True while the client sits in a room whose match is not over.
    /// Routes into finished rooms are dropped on the way.
    fn in_live_match(&self, client_id: Uuid) -> bool {
        let Some(route) = self.route(client_id) else {
            return false;
        };
        let live = self.session(route.room_id).is_some_and(|s| !s.is_finished());
        if !live {
            self.routes.remove(&client_id);
        }
        live
    }

    /// Leave the queue. No-op if the client is not waiting.
    pub fn dequeue(&self, client_id: Uuid) -> bool {
        let removed = self.queue.lock().dequeue_client(client_id);
        match removed {
            Some(player) => {
                player.client.send(ServerMsg::QueueLeft);
                info!(client_id = %client_id, "Player left matchmaking queue");
                true
            }
            None => false,
        }
    }

    /// Route a command to the client's room
    pub fn submit(&self, client_id: Uuid, command: Command) -> Result<(), MatchmakingError> {
        let (session, route) = self.session_for(client_id)?;
        session.submit(route.player_id, command)?;
        Ok(())
    }

    /// Advisory elixir drift check
    pub fn report_elixir(&self, client_id: Uuid, elixir: f32) -> Result<bool, MatchmakingError> {
        let (session, route) = self.session_for(client_id)?;
        session
            .audit_elixir(route.player_id, elixir)
            .ok_or(MatchmakingError::NotInMatch)
    }

    fn session_for(&self, client_id: Uuid) -> Result<(Arc<Session>, PlayerRoute), MatchmakingError> {
        let route = self.route(client_id).ok_or(MatchmakingError::NotInMatch)?;
        let session = self.session(route.room_id).ok_or(MatchmakingError::NotInMatch)?;
        Ok((session, route))
    }

    /// Transport closed: leave the queue or forfeit the running match
    pub fn handle_disconnect(&self, client_id: Uuid) {
        if self.queue.lock().dequeue_client(client_id).is_some() {
            debug!(client_id = %client_id, "Queued client disconnected");
        }

        if let Some((_, route)) = self.routes.remove(&client_id) {
            if let Some(session) = self.session(route.room_id) {
                session.handle_disconnect(route.player_id);
            }
        }
    }

    /// Rooms whose match has not finished
    fn live_rooms(&self) -> usize {
        self.sessions.iter().filter(|s| !s.is_finished()).count()
    }

    /// Pair players until fewer than two wait or room capacity is hit
    pub fn attempt_match_at(&self, now: Instant) {
        loop {
            if self.live_rooms() >= self.settings.max_rooms {
                debug!(max_rooms = self.settings.max_rooms, "Room capacity reached, pairing deferred");
                return;
            }

            let attempt = self.queue.lock().next_pair(now, self.timeout());
            match attempt {
                PairAttempt::NotEnough => return,
                PairAttempt::TimedOut(player) => Self::notify_timeout(&player),
                PairAttempt::Paired(first, second) => self.create_session(first, second, now),
            }
        }
    }

    fn notify_timeout(player: &QueuedPlayer) {
        player
            .client
            .error("matchmaking_timeout", "No opponent found in time");
        info!(player_id = %player.player_id, "Matchmaking timeout");
    }

    fn create_session(&self, first: QueuedPlayer, second: QueuedPlayer, now: Instant) {
        let room_id = Uuid::new_v4();
        let session = Arc::new(Session::new(
            room_id,
            self.config.clone(),
            self.validator.clone(),
        ));
        self.sessions.insert(room_id, session.clone());

        let seated = session
            .admit(first.client.clone(), first.name.clone())
            .and_then(|a| {
                session
                    .admit(second.client.clone(), second.name.clone())
                    .map(|b| (a, b))
            });

        match seated {
            Ok(((first_id, _), (second_id, _))) => {
                self.routes.insert(
                    first.client.id(),
                    PlayerRoute {
                        room_id,
                        player_id: first_id,
                    },
                );
                self.routes.insert(
                    second.client.id(),
                    PlayerRoute {
                        room_id,
                        player_id: second_id,
                    },
                );
                info!(
                    room_id = %room_id,
                    left = %first.name,
                    right = %second.name,
                    "Match created"
                );
            }
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Failed to seat players, re-queueing");
                session.cleanup();
                self.sessions.remove(&room_id);
                self.requeue(first, now);
                self.requeue(second, now);
            }
        }
    }

    /// Put a player back at the end of the queue without pairing
    fn requeue(&self, player: QueuedPlayer, now: Instant) {
        let QueuedPlayer { client, name, .. } = player;
        let player = QueuedPlayer::new(client.clone(), name, now);
        let player_id = player.player_id;
        let position = self.queue.lock().enqueue(player);
        client.send(ServerMsg::QueueJoined {
            player_id,
            queue_position: position,
        });
    }

    /// Periodic housekeeping at the current time
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now(), unix_millis())
    }

    /// Evict timed-out queue entries, reap empty or finished rooms, forget
    /// idle rate windows, then try to pair.
    pub fn sweep_at(&self, now: Instant, now_ms: u64) -> SweepReport {
        let evicted = self.queue.lock().evict_expired(now, self.timeout());
        for player in &evicted {
            Self::notify_timeout(player);
        }

        let reapable: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|s| s.is_empty() || s.is_finished())
            .map(|s| *s.key())
            .collect();
        for room_id in &reapable {
            if let Some((_, session)) = self.sessions.remove(room_id) {
                session.cleanup();
            }
            self.routes.retain(|_, route| route.room_id != *room_id);
        }

        let pruned = self.validator.prune_rate_windows(now_ms);

        self.attempt_match_at(now);

        let report = SweepReport {
            evicted: evicted.len(),
            reaped: reapable.len(),
            pruned,
        };
        if report != SweepReport::default() {
            debug!(
                evicted = report.evicted,
                reaped = report.reaped,
                pruned = report.pruned,
                "Matchmaking sweep"
            );
        }
        report
    }

    /// Stop the sweep and tear down every room. Idempotent.
    pub fn shutdown(&self) {
        self.sweeper.stop();

        for entry in self.sessions.iter() {
            entry.value().cleanup();
        }
        let rooms = self.room_count();
        self.sessions.clear();
        self.routes.clear();
        self.queue.lock().clear();

        info!(rooms, "Matchmaking service shut down");
    }

    pub fn queue_size(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn room_count(&self) -> usize {
        self.sessions.len()
    }

    fn route(&self, client_id: Uuid) -> Option<PlayerRoute> {
        self.routes.get(&client_id).map(|r| *r)
    }

    fn session(&self, room_id: Uuid) -> Option<Arc<Session>> {
        self.sessions.get(&room_id).map(|s| s.clone())
    }

    pub fn stats(&self) -> MatchmakingStats {
        let rooms: Vec<RoomInfo> = self.sessions.iter().map(|s| s.info()).collect();
        MatchmakingStats {
            queue_size: self.queue_size(),
            active_rooms: rooms.len(),
            rooms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{EndReason, TeamSide};
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_test::assert_ok;

    fn service_with(max_rooms: usize) -> MatchmakingService {
        MatchmakingService::new(
            Arc::new(GameConfig::default()),
            MatchmakingConfig {
                max_rooms,
                ..MatchmakingConfig::default()
            },
        )
    }

    fn service() -> MatchmakingService {
        service_with(100)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn got_match(rx: &mut UnboundedReceiver<ServerMsg>) -> bool {
        drain(rx)
            .iter()
            .any(|m| matches!(m, ServerMsg::MatchFound { .. }))
    }

    #[tokio::test]
    async fn two_players_are_paired_into_a_room() {
        let mm = service();
        let (a, mut a_rx) = ClientHandle::channel();
        let (b, mut b_rx) = ClientHandle::channel();
        let (a_id, b_id) = (a.id(), b.id());

        assert_ok!(mm.enqueue(a, Some("alice".into())));
        assert!(matches!(
            a_rx.try_recv(),
            Ok(ServerMsg::QueueJoined { queue_position: 1, .. })
        ));
        assert_ok!(mm.enqueue(b, None));

        assert_eq!(mm.queue_size(), 0);
        assert_eq!(mm.room_count(), 1);
        assert!(got_match(&mut a_rx));
        assert!(got_match(&mut b_rx));

        let (ra, rb) = (mm.route(a_id).unwrap(), mm.route(b_id).unwrap());
        assert_eq!(ra.room_id, rb.room_id);
        assert_ne!(ra.player_id, rb.player_id);
    }

    #[tokio::test]
    async fn pairing_is_first_in_first_out() {
        let mm = service();
        let (a, mut a_rx) = ClientHandle::channel();
        let (b, mut b_rx) = ClientHandle::channel();
        let (c, mut c_rx) = ClientHandle::channel();
        let c_id = c.id();

        mm.enqueue(a, Some("a".into())).unwrap();
        mm.enqueue(b, Some("b".into())).unwrap();
        mm.enqueue(c, Some("c".into())).unwrap();

        assert!(got_match(&mut a_rx));
        assert!(got_match(&mut b_rx));
        assert!(!got_match(&mut c_rx));
        assert_eq!(mm.queue_size(), 1);
        assert!(mm.route(c_id).is_none());
    }

    #[tokio::test]
    async fn queued_player_times_out_on_sweep() {
        let mm = service();
        let (a, mut a_rx) = ClientHandle::channel();
        let now = Instant::now();
        mm.enqueue_at(a, None, now).unwrap();
        drain(&mut a_rx);

        let report = mm.sweep_at(now + Duration::from_secs(31), unix_millis());
        assert_eq!(report.evicted, 1);
        assert_eq!(mm.queue_size(), 0);
        assert!(matches!(
            a_rx.try_recv(),
            Ok(ServerMsg::Error { code, .. }) if code == "matchmaking_timeout"
        ));
    }

    #[tokio::test]
    async fn rejoin_while_in_match_is_refused() {
        let mm = service();
        let (a, mut a_rx) = ClientHandle::channel();
        let (b, _b_rx) = ClientHandle::channel();
        mm.enqueue(a.clone(), None).unwrap();
        mm.enqueue(b, None).unwrap();
        drain(&mut a_rx);

        assert_eq!(mm.enqueue(a, None), Err(MatchmakingError::AlreadyInMatch));
        assert_eq!(mm.queue_size(), 0);
        assert!(matches!(
            a_rx.try_recv(),
            Ok(ServerMsg::Error { code, .. }) if code == "already_in_match"
        ));
    }

    #[tokio::test]
    async fn leave_queue_notifies_once() {
        let mm = service();
        let (a, mut a_rx) = ClientHandle::channel();
        let a_id = a.id();
        mm.enqueue(a, None).unwrap();
        drain(&mut a_rx);

        assert!(mm.dequeue(a_id));
        assert!(matches!(a_rx.try_recv(), Ok(ServerMsg::QueueLeft)));
        assert!(!mm.dequeue(a_id));
    }

    #[tokio::test]
    async fn commands_are_routed_to_the_players_room() {
        let mm = service();
        let (a, _a_rx) = ClientHandle::channel();
        let (b, _b_rx) = ClientHandle::channel();
        let a_id = a.id();
        mm.enqueue(a, None).unwrap();
        mm.enqueue(b, None).unwrap();

        let surrender = Command::Surrender {
            timestamp: unix_millis(),
        };
        assert_ok!(mm.submit(a_id, surrender.clone()));
        let room = mm.session(mm.route(a_id).unwrap().room_id).unwrap();
        assert_eq!(room.info().pending_commands, 1);

        assert_eq!(
            mm.submit(Uuid::new_v4(), surrender),
            Err(MatchmakingError::NotInMatch)
        );
        assert_eq!(mm.report_elixir(a_id, 5.0), Ok(true));
    }

    #[tokio::test]
    async fn disconnect_ends_match_and_sweep_reaps_room() {
        let mm = service();
        let (a, _a_rx) = ClientHandle::channel();
        let (b, mut b_rx) = ClientHandle::channel();
        let (a_id, b_id) = (a.id(), b.id());
        mm.enqueue(a, None).unwrap();
        mm.enqueue(b, None).unwrap();
        drain(&mut b_rx);

        mm.handle_disconnect(a_id);
        assert!(matches!(
            drain(&mut b_rx).last(),
            Some(ServerMsg::MatchEnded {
                winner: TeamSide::Right,
                reason: EndReason::Disconnect,
                ..
            })
        ));

        let report = mm.sweep_at(Instant::now(), unix_millis());
        assert_eq!(report.reaped, 1);
        assert_eq!(mm.room_count(), 0);
        assert!(mm.route(b_id).is_none());
    }

    #[tokio::test]
    async fn pairing_waits_for_room_capacity() {
        let mm = service_with(1);
        let clients: Vec<_> = (0..4).map(|_| ClientHandle::channel()).collect();
        let ids: Vec<Uuid> = clients.iter().map(|(c, _)| c.id()).collect();
        let mut receivers = Vec::new();
        for (client, rx) in clients {
            mm.enqueue(client, None).unwrap();
            receivers.push(rx);
        }

        assert_eq!(mm.room_count(), 1);
        assert_eq!(mm.queue_size(), 2);

        mm.handle_disconnect(ids[0]);
        mm.sweep_at(Instant::now(), unix_millis());

        assert_eq!(mm.room_count(), 1);
        assert_eq!(mm.queue_size(), 0);
        assert!(got_match(&mut receivers[2]));
        assert!(got_match(&mut receivers[3]));
    }

    #[tokio::test]
    async fn shutdown_releases_every_client() {
        let mm = service();
        let (a, mut a_rx) = ClientHandle::channel();
        let (b, mut b_rx) = ClientHandle::channel();
        let (c, mut c_rx) = ClientHandle::channel();
        mm.enqueue(a, None).unwrap();
        mm.enqueue(b, None).unwrap();
        mm.enqueue(c, None).unwrap();

        mm.shutdown();
        mm.shutdown();

        assert_eq!(mm.room_count(), 0);
        assert_eq!(mm.queue_size(), 0);
        for rx in [&mut a_rx, &mut b_rx, &mut c_rx] {
            drain(rx);
            assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Disconnected);
        }
    }
}
