// Per-user sliding-window flood detection.
//
// Every message both prunes the user's stale timestamps and records the new one.
// The window is strict: an entry exactly `window_ms` old no longer counts.

use dashmap::DashMap;

/// In-memory sliding window of recent message timestamps per user.
///
/// **DashMap:**
/// `entry()` holds the shard's write lock for the whole prune-append-count
/// sequence, so two messages from the same user can't interleave, while
/// users on other shards are processed in parallel.
pub struct SpamTracker {
    /// Maps user_id -> message timestamps (ms), oldest first
    windows: DashMap<u64, Vec<i64>>,
    window_ms: i64,
    max_messages_in_window: usize,
}

impl SpamTracker {
    pub fn new(window_ms: u64, max_messages_in_window: usize) -> Self {
        Self {
            windows: DashMap::new(),
            window_ms: i64::try_from(window_ms).unwrap_or(i64::MAX),
            max_messages_in_window,
        }
    }

    /// Record a message and report whether it pushes the user over the limit.
    pub fn register_and_check(&self, user_id: u64, now_ms: i64) -> bool {
        let window_ms = self.window_ms;
        let mut timestamps = self.windows.entry(user_id).or_default();

        timestamps.retain(|&t| now_ms.saturating_sub(t) < window_ms);
        timestamps.push(now_ms);

        timestamps.len() > self.max_messages_in_window
    }

    /// Drop users whose newest message is already outside the window.
    ///
    /// Their list would be pruned to nothing on the next message anyway, so
    /// this never changes a verdict. Returns how many users were evicted.
    pub fn sweep(&self, now_ms: i64) -> usize {
        let before = self.windows.len();
        let window_ms = self.window_ms;

        self.windows.retain(|_, timestamps| {
            timestamps
                .last()
                .is_some_and(|&newest| now_ms.saturating_sub(newest) < window_ms)
        });

        before.saturating_sub(self.windows.len())
    }

    /// Forget a user's recent messages (e.g. after a manual unmute).
    pub fn forget(&self, user_id: u64) {
        self.windows.remove(&user_id);
    }

    pub fn tracked_users(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_threshold_is_strictly_greater_than() {
        let tracker = SpamTracker::new(10_000, 5);

        // 5 messages inside the window are fine
        for i in 0..5 {
            assert!(
                !tracker.register_and_check(1, 1_000 + i * 100),
                "Message {} should not be spam",
                i
            );
        }

        // 6th message should trigger
        assert!(tracker.register_and_check(1, 1_600));
    }

    #[test]
    fn test_entry_exactly_window_old_is_excluded() {
        let tracker = SpamTracker::new(10_000, 5);

        // First message at t=0, then four more later on
        assert!(!tracker.register_and_check(1, 0));
        for t in [5_000, 6_000, 7_000, 8_000] {
            assert!(!tracker.register_and_check(1, t));
        }

        // At t=10_000 the t=0 entry is exactly window_ms old -> not counted,
        // so this is only the 5th message in the window.
        assert!(!tracker.register_and_check(1, 10_000));

        // One ms earlier it would have been the 6th
        let other = SpamTracker::new(10_000, 5);
        for t in [0, 5_000, 6_000, 7_000, 8_000] {
            other.register_and_check(2, t);
        }
        assert!(other.register_and_check(2, 9_999));
    }

    #[test]
    fn test_users_are_independent() {
        let tracker = SpamTracker::new(10_000, 2);

        assert!(!tracker.register_and_check(1, 0));
        assert!(!tracker.register_and_check(1, 1));
        assert!(!tracker.register_and_check(2, 2));
        assert!(tracker.register_and_check(1, 3));
        assert!(!tracker.register_and_check(2, 4));
    }

    #[test]
    fn test_list_stays_bounded_for_active_user() {
        let tracker = SpamTracker::new(1_000, 3);

        // One message every 300ms for a long time: at most 4 fit in 1s
        for i in 0..1_000 {
            tracker.register_and_check(7, i * 300);
        }

        let len = tracker.windows.get(&7).map(|w| w.len()).unwrap_or(0);
        assert!(len <= 4, "window grew to {}", len);
    }

    #[test]
    fn test_sweep_evicts_only_idle_users() {
        let tracker = SpamTracker::new(10_000, 5);

        tracker.register_and_check(1, 0);
        tracker.register_and_check(2, 0);
        tracker.register_and_check(2, 15_000);

        let evicted = tracker.sweep(20_000);

        assert_eq!(evicted, 1);
        assert_eq!(tracker.tracked_users(), 1);
        assert!(tracker.windows.contains_key(&2));
    }

    #[test]
    fn test_forget_resets_window() {
        let tracker = SpamTracker::new(10_000, 1);

        tracker.register_and_check(1, 0);
        assert!(tracker.register_and_check(1, 1));

        tracker.forget(1);
        assert!(!tracker.register_and_check(1, 2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_are_not_lost() {
        let tracker = Arc::new(SpamTracker::new(60_000, 1_000));

        let mut handles = Vec::new();
        for task in 0..8 {
            let tracker = Arc::clone(&tracker);
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    tracker.register_and_check(42, task * 50 + i);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let len = tracker.windows.get(&42).map(|w| w.len()).unwrap_or(0);
        assert_eq!(len, 400);
    }
}
