use chrono::Utc;
use lintpilot::run_log::{RunLogEntry, RunLogger, RunMode, RunStats, RunStatus};
use pretty_assertions::assert_eq;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tempfile::TempDir;

fn entry(found: usize, fixed: usize, status: RunStatus) -> RunLogEntry {
    RunLogEntry {
        timestamp: Utc::now(),
        repository: "/work/repo".into(),
        issues_found: found,
        issues_fixed: fixed,
        issues_deferred: 0,
        files_rolled_back: 0,
        errors: vec![],
        duration_seconds: 2.0,
        status,
        mode: RunMode::Apply,
    }
}

#[test]
fn appends_preserve_earlier_entries() {
    let state = TempDir::new().unwrap();
    let logger = RunLogger::in_dir(state.path());

    logger.log_run(&entry(5, 3, RunStatus::Completed)).unwrap();
    let first_line = fs::read_to_string(logger.path()).unwrap();

    logger.log_run(&entry(2, 0, RunStatus::Cancelled)).unwrap();
    let contents = fs::read_to_string(logger.path()).unwrap();

    assert!(contents.starts_with(&first_line));
    assert_eq!(contents.lines().count(), 2);

    let (entries, skipped) = logger.read_entries().unwrap();
    assert_eq!(skipped, 0);
    assert_eq!(entries[0].issues_fixed, 3);
    assert_eq!(entries[1].status, RunStatus::Cancelled);
}

#[test]
fn unreadable_lines_are_skipped_in_stats() {
    let state = TempDir::new().unwrap();
    let logger = RunLogger::in_dir(state.path());
    logger.log_run(&entry(4, 4, RunStatus::Completed)).unwrap();

    let mut file = OpenOptions::new().append(true).open(logger.path()).unwrap();
    writeln!(file, "{{ truncated").unwrap();
    drop(file);

    logger.log_run(&entry(6, 1, RunStatus::Failed)).unwrap();

    let (entries, skipped) = logger.read_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(skipped, 1);

    let stats = RunStats::from_entries(&entries);
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.total_issues_found, 10);
    assert_eq!(stats.total_fixes_applied, 5);
    assert_eq!(stats.success_rate, 50.0);
    assert_eq!(stats.average_duration_seconds, 2.0);
}

#[test]
fn missing_log_reads_as_empty() {
    let state = TempDir::new().unwrap();
    let (entries, skipped) = RunLogger::in_dir(&state.path().join("nested")).read_entries().unwrap();
    assert!(entries.is_empty());
    assert_eq!(skipped, 0);
}
