//! Sliding-window rate limit on AI-provider calls.
//!
//! The tracker is an explicit value handed to the orchestrator. Its state
//! lives behind a [`UsageStore`] so tests can swap the file for memory.
//! Storage problems never block a run: the tracker falls back to an
//! in-memory window and records a warning.

mod store;

use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use crate::config::UsageConfig;
pub use store::{FileUsageStore, MemoryUsageStore, StoreError, UsageSnapshot, UsageStore, USAGE_FILE_NAME};

pub struct UsageTracker {
    store: Box<dyn UsageStore>,
    limit: usize,
    window: Duration,
    /// Used once the store has failed.
    fallback: Mutex<Option<UsageSnapshot>>,
    warnings: Mutex<Vec<String>>,
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("store", &self.store.describe())
            .field("limit", &self.limit)
            .field("window", &self.window)
            .finish()
    }
}

impl UsageTracker {
    pub fn new(store: Box<dyn UsageStore>, config: &UsageConfig) -> Self {
        let window_seconds = i64::try_from(config.window_seconds).unwrap_or(i64::MAX);
        let tracker = Self {
            store,
            limit: config.limit,
            window: Duration::try_seconds(window_seconds).unwrap_or(Duration::MAX),
            fallback: Mutex::new(None),
            warnings: Mutex::new(Vec::new()),
        };
        if let Err(e) = tracker.store.load() {
            tracker.degrade(e);
        }
        tracker
    }

    pub fn in_memory(config: &UsageConfig) -> Self {
        Self::new(Box::new(MemoryUsageStore::new()), config)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_proceed(&self, provider: &str) -> bool {
        self.can_proceed_at(provider, Utc::now())
    }

    /// True iff fewer than `limit` calls for `provider` fall inside the
    /// window ending at `now`. Records nothing.
    pub fn can_proceed_at(&self, provider: &str, now: DateTime<Utc>) -> bool {
        let snapshot = self.current_snapshot();
        let used = snapshot
            .get(provider)
            .map_or(0, |calls| self.count_in_window(calls, now));
        used < self.limit
    }

    pub fn record_call(&self, provider: &str) -> bool {
        self.record_call_at(provider, Utc::now())
    }

    /// Append `now` to the provider's window and prune expired entries.
    ///
    /// The check against `limit` is repeated inside the store update, so a
    /// concurrent run that filled the window in the meantime is not
    /// overcounted. Returns whether the call was recorded.
    pub fn record_call_at(&self, provider: &str, now: DateTime<Utc>) -> bool {
        let mut recorded = false;
        let mut apply = |snapshot: &mut UsageSnapshot| {
            recorded = self.record_into(snapshot, provider, now);
        };

        if self.is_degraded() {
            let mut fallback = self.fallback.lock().unwrap_or_else(PoisonError::into_inner);
            apply(fallback.get_or_insert_with(UsageSnapshot::new));
            return recorded;
        }

        match self.store.update(&mut apply) {
            Ok(_) => {
                debug!(provider, recorded, "usage recorded");
                recorded
            }
            Err(e) => {
                self.degrade(e);
                let mut fallback = self.fallback.lock().unwrap_or_else(PoisonError::into_inner);
                let mut recorded = false;
                if let Some(snapshot) = fallback.as_mut() {
                    recorded = self.record_into(snapshot, provider, now);
                }
                recorded
            }
        }
    }

    /// Calls still inside the window ending at `now`.
    pub fn usage_at(&self, provider: &str, now: DateTime<Utc>) -> usize {
        self.current_snapshot()
            .get(provider)
            .map_or(0, |calls| self.count_in_window(calls, now))
    }

    /// Persistence warnings collected so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_into(&self, snapshot: &mut UsageSnapshot, provider: &str, now: DateTime<Utc>) -> bool {
        let calls = snapshot.entry(provider.to_string()).or_default();
        calls.retain(|t| self.in_window(*t, now));
        if calls.len() >= self.limit {
            return false;
        }
        calls.push(now);
        calls.sort();
        true
    }

    fn in_window(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(timestamp) < self.window
    }

    fn count_in_window(&self, calls: &[DateTime<Utc>], now: DateTime<Utc>) -> usize {
        calls.iter().filter(|t| self.in_window(**t, now)).count()
    }

    fn is_degraded(&self) -> bool {
        self.fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn current_snapshot(&self) -> UsageSnapshot {
        if let Some(snapshot) = self
            .fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return snapshot.clone();
        }
        match self.store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.degrade(e);
                UsageSnapshot::new()
            }
        }
    }

    /// Switch to in-memory tracking. Usage starts empty, so a broken store
    /// can never lock AI assistance out for good.
    fn degrade(&self, error: StoreError) {
        let message = format!("{error}; tracking AI usage in memory for this run");
        warn!("{message}");
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        self.fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(UsageSnapshot::new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(limit: usize, window_seconds: u64) -> UsageConfig {
        UsageConfig {
            limit,
            window_seconds,
        }
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn blocks_after_limit_until_window_slides() {
        let tracker = UsageTracker::in_memory(&config(2, 60));
        assert!(tracker.can_proceed_at("groq", at(0)));
        assert!(tracker.record_call_at("groq", at(0)));
        assert!(tracker.record_call_at("groq", at(10)));
        assert!(!tracker.can_proceed_at("groq", at(20)));
        assert!(!tracker.record_call_at("groq", at(20)));

        assert!(tracker.can_proceed_at("anthropic", at(20)));
        assert!(!tracker.can_proceed_at("groq", at(59)));
        assert!(tracker.can_proceed_at("groq", at(60)));
        assert_eq!(tracker.usage_at("groq", at(65)), 1);
    }

    #[test]
    fn can_proceed_does_not_record() {
        let tracker = UsageTracker::in_memory(&config(1, 60));
        for _ in 0..5 {
            assert!(tracker.can_proceed_at("groq", at(0)));
        }
        assert_eq!(tracker.usage_at("groq", at(0)), 0);
    }

    #[test]
    fn zero_limit_never_proceeds() {
        let tracker = UsageTracker::in_memory(&config(0, 60));
        assert!(!tracker.can_proceed_at("groq", at(0)));
        assert!(!tracker.record_call_at("groq", at(0)));
    }

    proptest! {
        #[test]
        fn window_never_exceeds_limit(
            limit in 1usize..6,
            window in 1u64..120,
            steps in prop::collection::vec(0i64..30, 1..60),
        ) {
            let tracker = UsageTracker::in_memory(&config(limit, window));
            let mut now = 0;
            for step in steps {
                now += step;
                tracker.record_call_at("p", at(now));
                prop_assert!(tracker.usage_at("p", at(now)) <= limit);
            }
        }
    }
}
