use serde::Serialize;
use std::path::PathBuf;

use crate::core::Issue;

/// Why an issue was left for later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DeferReason {
    RateLimited { provider: String },
    /// No deterministic fixer and no AI assistant configured.
    NoAssistant,
    AssistantFailed(String),
}

impl std::fmt::Display for DeferReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeferReason::RateLimited { provider } => write!(f, "rate limited ({provider})"),
            DeferReason::NoAssistant => f.write_str("needs AI or human review"),
            DeferReason::AssistantFailed(message) => write!(f, "AI assistant failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FixOutcome {
    Fixed,
    Deferred(DeferReason),
    /// The fixer found nothing to change, or the file could not be used.
    Skipped(String),
    /// Fixed in memory, then discarded with the rest of the file.
    RolledBack(String),
}

impl FixOutcome {
    pub fn is_fixed(&self) -> bool {
        matches!(self, FixOutcome::Fixed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueOutcome {
    pub issue: Issue,
    pub outcome: FixOutcome,
}

/// Outcome of one file's fix cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixResult {
    pub file_path: PathBuf,
    pub issues_attempted: usize,
    pub issues_fixed: usize,
    pub regression_detected: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub result: FixResult,
    pub outcomes: Vec<IssueOutcome>,
    /// New content was (or, in a dry run, would have been) written.
    pub changed: bool,
}

impl FileReport {
    pub fn count(&self, predicate: impl Fn(&FixOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.outcome)).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeferredIssue {
    pub issue: Issue,
    pub reason: DeferReason,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    pub deferred: Vec<DeferredIssue>,
    pub warnings: Vec<String>,
    pub cancelled: bool,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn results(&self) -> impl Iterator<Item = &FixResult> {
        self.files.iter().map(|f| &f.result)
    }

    pub fn issues_attempted(&self) -> usize {
        self.results().map(|r| r.issues_attempted).sum()
    }

    pub fn issues_fixed(&self) -> usize {
        self.results().map(|r| r.issues_fixed).sum()
    }

    pub fn issues_deferred(&self) -> usize {
        self.deferred.len()
    }

    pub fn issues_skipped(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.count(|o| matches!(o, FixOutcome::Skipped(_))))
            .sum()
    }

    pub fn files_rolled_back(&self) -> usize {
        self.results().filter(|r| r.regression_detected).count()
    }

    pub fn changed_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.changed)
            .map(|f| f.result.file_path.clone())
            .collect()
    }

    /// Per-file errors, for the run log.
    pub fn errors(&self) -> Vec<String> {
        self.results()
            .filter_map(|r| {
                r.error
                    .as_ref()
                    .map(|e| format!("{}: {}", r.file_path.display(), e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_serialize_with_status_tags() {
        let json = serde_json::to_value(FixOutcome::Deferred(DeferReason::RateLimited {
            provider: "groq".into(),
        }))
        .unwrap();
        assert_eq!(json["status"], "deferred");
        assert_eq!(json["detail"]["reason"], "rate_limited");
        assert_eq!(json["detail"]["detail"]["provider"], "groq");
    }

    #[test]
    fn totals_add_up_across_files() {
        let result = |fixed, regression| FixResult {
            file_path: PathBuf::from("a.py"),
            issues_attempted: 3,
            issues_fixed: fixed,
            regression_detected: regression,
            error: regression.then(|| "file no longer parses".to_string()),
        };
        let summary = RunSummary {
            files: vec![
                FileReport {
                    result: result(2, false),
                    outcomes: vec![],
                    changed: true,
                },
                FileReport {
                    result: result(0, true),
                    outcomes: vec![],
                    changed: false,
                },
            ],
            ..RunSummary::default()
        };
        assert_eq!(summary.issues_attempted(), 6);
        assert_eq!(summary.issues_fixed(), 2);
        assert_eq!(summary.files_rolled_back(), 1);
        assert_eq!(summary.changed_files().len(), 1);
        assert_eq!(summary.errors(), vec!["a.py: file no longer parses".to_string()]);
    }
}
