//! Usage tracking persisted in a state directory.

use chrono::{Duration, Utc};
use lintpilot::config::UsageConfig;
use lintpilot::usage::{FileUsageStore, UsageStore, UsageTracker};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn tracker(dir: &std::path::Path, limit: usize) -> UsageTracker {
    UsageTracker::new(
        Box::new(FileUsageStore::in_dir(dir)),
        &UsageConfig {
            limit,
            window_seconds: 60,
        },
    )
}

#[test]
fn usage_survives_across_trackers() {
    let state = TempDir::new().unwrap();
    let now = Utc::now();

    let first = tracker(state.path(), 2);
    assert!(first.record_call_at("groq", now));
    assert!(first.record_call_at("groq", now));
    assert!(first.warnings().is_empty());

    let second = tracker(state.path(), 2);
    assert!(!second.can_proceed_at("groq", now));
    assert!(second.can_proceed_at("anthropic", now));
    assert!(second.can_proceed_at("groq", now + Duration::seconds(61)));
}

#[test]
fn corrupt_store_fails_open_with_a_warning() {
    let state = TempDir::new().unwrap();
    let store = FileUsageStore::in_dir(state.path());
    fs::write(store.path(), "{ not json").unwrap();

    let tracker = tracker(state.path(), 1);
    assert_eq!(tracker.warnings().len(), 1);
    assert!(tracker.can_proceed("groq"));
    assert!(tracker.record_call("groq"));
    assert!(!tracker.can_proceed("groq"));
}

#[test]
fn concurrent_trackers_never_exceed_the_limit() {
    let state = Arc::new(TempDir::new().unwrap());
    let limit = 5;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                let tracker = tracker(state.path(), limit);
                (0..3).filter(|_| tracker.record_call("groq")).count()
            })
        })
        .collect();
    let recorded: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(recorded, limit);
    let snapshot = FileUsageStore::in_dir(state.path()).load().unwrap();
    assert_eq!(snapshot["groq"].len(), limit);
}
