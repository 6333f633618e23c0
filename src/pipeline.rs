//! classify → plan → apply → review → log, for one repository.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use tracing::{info, warn};

use crate::analyzers::{detect_languages, run_analyzers, Analyzer};
use crate::assist::review::{FileReview, SemanticReview};
use crate::assist::FixAssistant;
use crate::classifier::{ClassifiedIssue, RuleClassifier, Triage};
use crate::config::{LintpilotConfig, SkipMatcher};
use crate::core::{Category, Issue, Language};
use crate::errors::{Error, Result};
use crate::fixers::FixContext;
use crate::io::FileSystem;
use crate::orchestrator::{ExecutionMode, FixOrchestrator, FixPlan, PlanOptions, PlanSummary, RunSummary};
use crate::run_log::{RunLogEntry, RunLogger, RunMode, RunStatus};
use crate::safety::SafetyChecker;
use crate::usage::UsageTracker;

/// Issue counts per category and rule.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriageCounts {
    pub safe: usize,
    pub risky: usize,
    pub suggest: usize,
    pub by_rule: BTreeMap<Category, BTreeMap<String, usize>>,
}

impl TriageCounts {
    fn from_triage(triage: &Triage) -> Self {
        let by_rule = [Category::Safe, Category::Risky, Category::Suggest]
            .into_iter()
            .map(|category| (category, triage.counts_by_rule(category)))
            .filter(|(_, counts)| !counts.is_empty())
            .collect();
        Self {
            safe: triage.safe.len(),
            risky: triage.risky.len(),
            suggest: triage.suggest.len(),
            by_rule,
        }
    }
}

/// Everything one `run` produced, for the report writers.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub repository: PathBuf,
    pub mode: RunMode,
    pub status: RunStatus,
    pub languages: BTreeMap<Language, usize>,
    pub issues_found: usize,
    pub triage: TriageCounts,
    /// RISKY and SUGGEST issues, best review candidates first.
    pub review_queue: Vec<ClassifiedIssue>,
    pub plan: PlanSummary,
    /// Absent in analyze-only mode.
    pub summary: Option<RunSummary>,
    /// AI review of files in the review queue; empty when AI is off.
    pub reviews: Vec<FileReview>,
    pub warnings: Vec<String>,
    pub duration_seconds: f64,
}

impl RunReport {
    pub fn issues_fixed(&self) -> usize {
        self.summary.as_ref().map_or(0, RunSummary::issues_fixed)
    }
}

pub struct Pipeline<'a> {
    config: &'a LintpilotConfig,
    fs: &'a dyn FileSystem,
    analyzers: Vec<Box<dyn Analyzer>>,
    usage: UsageTracker,
    assistant: Option<Box<dyn FixAssistant>>,
    run_log: Option<RunLogger>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a LintpilotConfig,
        fs: &'a dyn FileSystem,
        analyzers: Vec<Box<dyn Analyzer>>,
        usage: UsageTracker,
    ) -> Self {
        Self {
            config,
            fs,
            analyzers,
            usage,
            assistant: None,
            run_log: None,
            cancel: None,
        }
    }

    pub fn with_assistant(mut self, assistant: Option<Box<dyn FixAssistant>>) -> Self {
        self.assistant = assistant;
        self
    }

    pub fn with_run_log(mut self, logger: RunLogger) -> Self {
        self.run_log = Some(logger);
        self
    }

    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run the whole pipeline. Only configuration, analyzer and repository
    /// problems are errors; they are raised before any file is written.
    pub fn run(&self, repo: &Path, mode: RunMode, only_rules: &[String]) -> Result<RunReport> {
        let start = Instant::now();
        match self.run_inner(repo, mode, only_rules, start) {
            Ok(report) => Ok(report),
            Err(error) => {
                self.log_failure(repo, mode, &error, start);
                Err(error)
            }
        }
    }

    fn run_inner(
        &self,
        repo: &Path,
        mode: RunMode,
        only_rules: &[String],
        start: Instant,
    ) -> Result<RunReport> {
        if !repo.is_dir() {
            return Err(Error::repository(repo, "not a directory"));
        }
        let repo = repo
            .canonicalize()
            .map_err(|e| Error::repository(repo, e.to_string()))?;

        let skip = SkipMatcher::new(&self.config.paths.skip)
            .map_err(|e| Error::configuration(format!("invalid skip pattern: {e}")))?;
        let languages = detect_languages(&repo, &skip)?;
        info!(?languages, "languages detected");

        let analysis = run_analyzers(&repo, &self.analyzers, &languages)?;
        let mut warnings = analysis.warnings;
        let issues: Vec<Issue> = analysis
            .issues
            .into_iter()
            .filter(|issue| {
                let relative = issue.file_path().strip_prefix(&repo).unwrap_or(issue.file_path());
                !skip.is_skipped(relative)
            })
            .collect();

        let classifier = RuleClassifier::with_overrides(&self.config.rules.overrides);
        let triage = classifier.group_by_category(&issues);
        let plan = FixPlan::build(
            &triage,
            &classifier,
            &self.config.rules,
            &PlanOptions {
                only_rules: only_rules.to_vec(),
                max_issues: Some(self.config.fix.max_issues_per_run),
            },
        );
        if plan.summary().over_limit > 0 {
            warnings.push(format!(
                "{} SAFE issue(s) left for a later run (max_issues_per_run = {})",
                plan.summary().over_limit,
                self.config.fix.max_issues_per_run
            ));
        }

        let summary = match mode {
            RunMode::Analyze => None,
            RunMode::Apply | RunMode::DryRun => Some(self.execute(&plan, mode)),
        };
        if let Some(summary) = &summary {
            warnings.extend(summary.warnings.iter().cloned());
        }

        let cancelled = summary.as_ref().is_some_and(|s| s.cancelled);
        let review_queue: Vec<ClassifiedIssue> = triage.review_queue().into_iter().cloned().collect();
        let reviews = if cancelled {
            Vec::new()
        } else {
            self.review(&review_queue)
        };

        for warning in self.usage.warnings() {
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }

        let status = if cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        let mut report = RunReport {
            repository: repo,
            mode,
            status,
            languages,
            issues_found: issues.len(),
            triage: TriageCounts::from_triage(&triage),
            review_queue,
            plan: plan.summary().clone(),
            summary,
            reviews,
            warnings,
            duration_seconds: start.elapsed().as_secs_f64(),
        };

        if let Some(warning) = self.log_report(&report) {
            report.warnings.push(warning);
        }
        Ok(report)
    }

    fn execute(&self, plan: &FixPlan, mode: RunMode) -> RunSummary {
        let checker = SafetyChecker::new(self.config.fix.max_shrink_ratio);
        let execution_mode = if mode == RunMode::Apply {
            ExecutionMode::Apply
        } else {
            ExecutionMode::DryRun
        };

        let mut orchestrator = FixOrchestrator::new(self.fs, &checker)
            .with_mode(execution_mode)
            .with_context(FixContext {
                skip_init_files: self.config.rules.skip_init_files,
            })
            .with_context_lines(self.config.ai.context_lines);
        if let Some(assistant) = self.assistant.as_deref() {
            orchestrator = orchestrator.with_assistant(assistant, &self.usage);
        }
        if let Some(flag) = self.cancel {
            orchestrator = orchestrator.with_cancellation(flag);
        }
        orchestrator.execute(plan)
    }

    fn review(&self, queue: &[ClassifiedIssue]) -> Vec<FileReview> {
        let Some(assistant) = self.assistant.as_deref() else {
            return Vec::new();
        };
        if self.config.ai.review_files == 0 || queue.is_empty() {
            return Vec::new();
        }
        let mut review = SemanticReview::new(assistant, &self.usage, self.fs, self.config.ai.review_files);
        if let Some(flag) = self.cancel {
            review = review.with_cancellation(flag);
        }
        let reviews = review.run(queue);
        info!(files = reviews.len(), "review finished");
        reviews
    }

    fn log_report(&self, report: &RunReport) -> Option<String> {
        let summary = report.summary.as_ref();
        let entry = RunLogEntry {
            timestamp: Utc::now(),
            repository: report.repository.display().to_string(),
            issues_found: report.issues_found,
            issues_fixed: report.issues_fixed(),
            issues_deferred: summary.map_or(0, RunSummary::issues_deferred),
            files_rolled_back: summary.map_or(0, RunSummary::files_rolled_back),
            errors: summary.map(RunSummary::errors).unwrap_or_default(),
            duration_seconds: report.duration_seconds,
            status: report.status,
            mode: report.mode,
        };
        self.append(&entry)
    }

    fn log_failure(&self, repo: &Path, mode: RunMode, error: &Error, start: Instant) {
        let entry = RunLogEntry {
            timestamp: Utc::now(),
            repository: repo.display().to_string(),
            issues_found: 0,
            issues_fixed: 0,
            issues_deferred: 0,
            files_rolled_back: 0,
            errors: vec![format!("{}: {error}", error.kind())],
            duration_seconds: start.elapsed().as_secs_f64(),
            status: RunStatus::Failed,
            mode,
        };
        self.append(&entry);
    }

    fn append(&self, entry: &RunLogEntry) -> Option<String> {
        let logger = self.run_log.as_ref()?;
        match logger.log_run(entry) {
            Ok(()) => None,
            Err(e) => {
                warn!("{e}");
                Some(e.to_string())
            }
        }
    }
}
