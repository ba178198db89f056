//! Matchmaking queue implementation

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::ws::ClientHandle;

/// Player waiting for an opponent
#[derive(Debug, Clone)]
pub struct QueuedPlayer {
    pub player_id: Uuid,
    pub client: ClientHandle,
    pub name: String,
    pub queued_at: Instant,
}

impl QueuedPlayer {
    pub fn new(client: ClientHandle, name: String, queued_at: Instant) -> Self {
        Self {
            player_id: Uuid::new_v4(),
            client,
            name,
            queued_at,
        }
    }

    /// How long this player has been waiting at `now`
    pub fn wait_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.queued_at)
    }

    fn expired(&self, now: Instant, timeout: Duration) -> bool {
        self.wait_time(now) > timeout
    }
}

/// Result of one pairing attempt
#[derive(Debug)]
pub enum PairAttempt {
    /// Fewer than two players waiting
    NotEnough,
    /// One of the two oldest waited too long and was removed
    TimedOut(QueuedPlayer),
    /// The two oldest players, oldest first
    Paired(QueuedPlayer, QueuedPlayer),
}

/// FIFO waiting list. One entry per client.
#[derive(Default)]
pub struct MatchmakingQueue {
    queue: VecDeque<QueuedPlayer>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player, replacing any earlier entry from the same client.
    /// Returns the 1-based queue position.
    pub fn enqueue(&mut self, player: QueuedPlayer) -> usize {
        let client_id = player.client.id();
        self.queue.retain(|p| p.client.id() != client_id);
        self.queue.push_back(player);
        self.queue.len()
    }

    /// Remove the entry owned by a client
    pub fn dequeue_client(&mut self, client_id: Uuid) -> Option<QueuedPlayer> {
        let pos = self.queue.iter().position(|p| p.client.id() == client_id)?;
        self.queue.remove(pos)
    }

    /// Take the two oldest players, unless one of them has outwaited
    /// `timeout`, in which case only that one is removed.
    pub fn next_pair(&mut self, now: Instant, timeout: Duration) -> PairAttempt {
        if self.queue.len() < 2 {
            return PairAttempt::NotEnough;
        }

        if let Some(idx) = self
            .queue
            .iter()
            .take(2)
            .position(|p| p.expired(now, timeout))
        {
            return match self.queue.remove(idx) {
                Some(player) => PairAttempt::TimedOut(player),
                None => PairAttempt::NotEnough,
            };
        }

        match (self.queue.pop_front(), self.queue.pop_front()) {
            (Some(first), Some(second)) => PairAttempt::Paired(first, second),
            _ => PairAttempt::NotEnough,
        }
    }

    /// Remove every entry older than `timeout`
    pub fn evict_expired(&mut self, now: Instant, timeout: Duration) -> Vec<QueuedPlayer> {
        let mut evicted = Vec::new();
        self.queue.retain(|p| {
            if p.expired(now, timeout) {
                evicted.push(p.clone());
                false
            } else {
                true
            }
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drop every entry and its client handle
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn player(name: &str, queued_at: Instant) -> QueuedPlayer {
        let (client, _rx) = ClientHandle::channel();
        QueuedPlayer::new(client, name.to_string(), queued_at)
    }

    #[test]
    fn pairs_two_oldest_in_order() {
        let t0 = Instant::now();
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(player("a", t0));
        queue.enqueue(player("b", t0 + Duration::from_millis(1)));
        assert_eq!(queue.enqueue(player("c", t0 + Duration::from_millis(2))), 3);

        match queue.next_pair(t0 + Duration::from_millis(3), TIMEOUT) {
            PairAttempt::Paired(first, second) => {
                assert_eq!(first.name, "a");
                assert_eq!(second.name, "b");
            }
            other => panic!("expected a pair, got {other:?}"),
        }
        assert_eq!(queue.len(), 1);
        assert!(matches!(
            queue.next_pair(t0 + Duration::from_millis(3), TIMEOUT),
            PairAttempt::NotEnough
        ));
    }

    #[test]
    fn rejoin_replaces_previous_entry() {
        let t0 = Instant::now();
        let mut queue = MatchmakingQueue::new();
        let first = player("a", t0);
        let client = first.client.clone();
        queue.enqueue(first);
        queue.enqueue(player("b", t0));

        let position = queue.enqueue(QueuedPlayer::new(client.clone(), "a".into(), t0));
        assert_eq!(position, 2);
        assert_eq!(queue.len(), 2);
        assert!(queue.dequeue_client(client.id()).is_some());
        assert!(queue.dequeue_client(client.id()).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn stale_head_is_evicted_instead_of_paired() {
        let t0 = Instant::now();
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(player("old", t0));
        queue.enqueue(player("fresh", t0 + Duration::from_secs(29)));

        match queue.next_pair(t0 + Duration::from_secs(31), TIMEOUT) {
            PairAttempt::TimedOut(p) => assert_eq!(p.name, "old"),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn evict_expired_keeps_recent_entries() {
        let t0 = Instant::now();
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(player("old", t0));
        queue.enqueue(player("fresh", t0 + Duration::from_secs(10)));

        let evicted = queue.evict_expired(t0 + Duration::from_secs(31), TIMEOUT);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].name, "old");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn dequeue_unknown_client_is_noop() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(player("a", Instant::now()));
        assert!(queue.dequeue_client(Uuid::new_v4()).is_none());
        assert_eq!(queue.len(), 1);
    }
}
