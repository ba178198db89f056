//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Milliseconds between two instants, zero if `later` is not after `earlier`
pub fn millis_between(earlier: Instant, later: Instant) -> f32 {
    later.saturating_duration_since(earlier).as_secs_f32() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_between_never_negative() {
        let now = Instant::now();
        let later = now + Duration::from_millis(50);
        assert!((millis_between(now, later) - 50.0).abs() < 0.01);
        assert_eq!(millis_between(later, now), 0.0);
    }

    #[test]
    fn unix_millis_is_recent() {
        // 2020-01-01 in unix millis
        assert!(unix_millis() > 1_577_836_800_000);
    }
}
