//! Append-only run history, one JSON object per line.
//!
//! Writing is best effort: a failed append is returned to the caller as a
//! [`RunLogError`] to be reported as a warning, never as a run failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const RUN_LOG_FILE_NAME: &str = "runs.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
    /// Aborted by a fatal error before any file was touched.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Analyze,
    DryRun,
    Apply,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RunMode::Analyze => "analyze",
            RunMode::DryRun => "dry-run",
            RunMode::Apply => "apply",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub repository: String,
    pub issues_found: usize,
    pub issues_fixed: usize,
    #[serde(default)]
    pub issues_deferred: usize,
    #[serde(default)]
    pub files_rolled_back: usize,
    #[serde(default)]
    pub errors: Vec<String>,
    pub duration_seconds: f64,
    pub status: RunStatus,
    pub mode: RunMode,
}

#[derive(Debug, Error)]
#[error("could not write run log {}: {source}", path.display())]
pub struct RunLogError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Clone)]
pub struct RunLogger {
    path: PathBuf,
}

impl RunLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(RUN_LOG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Earlier lines are never rewritten.
    pub fn log_run(&self, entry: &RunLogEntry) -> Result<(), RunLogError> {
        let error = |source: std::io::Error| RunLogError {
            path: self.path.clone(),
            source,
        };
        let mut line = serde_json::to_string(entry).map_err(|e| error(e.into()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(error)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(error)?;
        // One write call per entry keeps concurrent appends line-atomic.
        file.write_all(line.as_bytes()).map_err(error)?;
        debug!(path = %self.path.display(), "run logged");
        Ok(())
    }

    /// All readable entries, oldest first, plus the number of lines skipped
    /// because they could not be parsed.
    pub fn read_entries(&self) -> Result<(Vec<RunLogEntry>, usize), RunLogError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(source) => {
                return Err(RunLogError {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut entries = Vec::new();
        let mut skipped = 0;
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RunLogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("skipping run log line {}: {e}", index + 1);
                    skipped += 1;
                }
            }
        }
        Ok((entries, skipped))
    }
}

/// Aggregates over the run history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub total_runs: usize,
    pub total_issues_found: usize,
    pub total_fixes_applied: usize,
    pub total_errors: usize,
    pub total_deferred: usize,
    pub files_rolled_back: usize,
    pub average_duration_seconds: f64,
    /// Percentage of runs that completed.
    pub success_rate: f64,
    pub last_run: Option<DateTime<Utc>>,
}

impl RunStats {
    pub fn from_entries(entries: &[RunLogEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let runs = entries.len() as f64;
        let completed = entries
            .iter()
            .filter(|e| e.status == RunStatus::Completed)
            .count() as f64;
        let total_duration: f64 = entries.iter().map(|e| e.duration_seconds).sum();

        Self {
            total_runs: entries.len(),
            total_issues_found: entries.iter().map(|e| e.issues_found).sum(),
            total_fixes_applied: entries.iter().map(|e| e.issues_fixed).sum(),
            total_errors: entries.iter().map(|e| e.errors.len()).sum(),
            total_deferred: entries.iter().map(|e| e.issues_deferred).sum(),
            files_rolled_back: entries.iter().map(|e| e.files_rolled_back).sum(),
            average_duration_seconds: round_to(total_duration / runs, 2),
            success_rate: round_to(completed / runs * 100.0, 1),
            last_run: entries.iter().map(|e| e.timestamp).max(),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(fixed: usize, status: RunStatus, duration: f64) -> RunLogEntry {
        RunLogEntry {
            timestamp: Utc::now(),
            repository: "/repo".into(),
            issues_found: 4,
            issues_fixed: fixed,
            issues_deferred: 1,
            files_rolled_back: 0,
            errors: if status == RunStatus::Failed {
                vec!["ruff not installed".into()]
            } else {
                vec![]
            },
            duration_seconds: duration,
            status,
            mode: RunMode::Apply,
        }
    }

    #[test]
    fn stats_match_history() {
        let stats = RunStats::from_entries(&[
            entry(3, RunStatus::Completed, 1.0),
            entry(0, RunStatus::Failed, 0.5),
            entry(1, RunStatus::Cancelled, 2.0),
        ]);
        assert_eq!(stats.total_runs, 3);
        assert_eq!(stats.total_issues_found, 12);
        assert_eq!(stats.total_fixes_applied, 4);
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.average_duration_seconds, 1.17);
        assert_eq!(stats.success_rate, 33.3);
        assert_eq!(RunStats::from_entries(&[]), RunStats::default());
    }

    #[test]
    fn unwritable_log_is_an_error_value() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let logger = RunLogger::in_dir(&blocker);
        assert!(logger.log_run(&entry(1, RunStatus::Completed, 1.0)).is_err());
    }
}
