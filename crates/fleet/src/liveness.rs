//! Liveness and reload decisions, derived lazily from stored timestamps.

/// A worker whose last heartbeat is at least this old counts as offline.
pub const STALE_WINDOW_MS: i64 = 90_000;

/// Poll interval workers should use. Anything at or under 60s leaves a full
/// missed cycle of margin inside [`STALE_WINDOW_MS`].
pub const RECOMMENDED_POLL_INTERVAL_MS: i64 = 45_000;

/// Whether a worker counts as online at `now_ms`.
///
/// A worker with no heartbeat on record is offline. The window is exclusive:
/// exactly `STALE_WINDOW_MS` of silence already reads as offline.
pub fn is_online(last_heartbeat_at: Option<i64>, now_ms: i64) -> bool {
    match last_heartbeat_at {
        Some(at) => now_ms - at < STALE_WINDOW_MS,
        None => false,
    }
}

/// Whether a worker holding config applied at `last_applied` must reload
/// after observing `current` from the store.
pub fn needs_reload(last_applied: i64, current: i64) -> bool {
    current > last_applied
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_090_000;

    #[test]
    fn online_inside_the_window() {
        assert!(is_online(Some(NOW - 1), NOW));
        assert!(is_online(Some(NOW - 89_999), NOW));
    }

    #[test]
    fn offline_at_and_past_the_window() {
        assert!(!is_online(Some(NOW - 90_000), NOW));
        assert!(!is_online(Some(NOW - 90_001), NOW));
    }

    #[test]
    fn no_heartbeat_is_offline() {
        assert!(!is_online(None, NOW));
    }

    #[test]
    fn clock_skewed_heartbeat_counts_as_online() {
        // A heartbeat a few seconds in the future happens across hosts.
        assert!(is_online(Some(NOW + 5_000), NOW));
    }

    #[test]
    fn reload_only_when_signal_moved_forward() {
        assert!(needs_reload(0, 1));
        assert!(needs_reload(1_000, 1_001));
        assert!(!needs_reload(1_000, 1_000));
        assert!(!needs_reload(1_000, 999));
    }

    #[test]
    fn poll_interval_leaves_margin() {
        assert!(RECOMMENDED_POLL_INTERVAL_MS * 2 < STALE_WINDOW_MS);
    }
}
