use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, info_span, warn};

use super::plan::{FilePlan, FixPlan, PlannedIssue};
use super::summary::{DeferReason, DeferredIssue, FileReport, FixOutcome, FixResult, IssueOutcome, RunSummary};
use crate::assist::{AssistRequest, FixAssistant};
use crate::fixers::{apply_suggestion, FixApplication, FixContext, FixStrategy, SourceBuffer};
use crate::io::FileSystem;
use crate::safety::{ChangeProfile, SafetyChecker};
use crate::usage::UsageTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Write approved content to disk.
    Apply,
    /// Apply and check in memory only.
    DryRun,
}

/// Applies a [`FixPlan`] file by file.
///
/// New content is staged in memory and written with one atomic write only
/// after the safety checker approves it. A rejected file is never written,
/// so its on-disk bytes stay exactly as they were.
pub struct FixOrchestrator<'a> {
    fs: &'a dyn FileSystem,
    checker: &'a SafetyChecker,
    assistant: Option<&'a dyn FixAssistant>,
    usage: Option<&'a UsageTracker>,
    cancel: Option<&'a AtomicBool>,
    ctx: FixContext,
    mode: ExecutionMode,
    context_lines: usize,
}

impl<'a> FixOrchestrator<'a> {
    pub fn new(fs: &'a dyn FileSystem, checker: &'a SafetyChecker) -> Self {
        Self {
            fs,
            checker,
            assistant: None,
            usage: None,
            cancel: None,
            ctx: FixContext::default(),
            mode: ExecutionMode::Apply,
            context_lines: 5,
        }
    }

    pub fn with_assistant(mut self, assistant: &'a dyn FixAssistant, usage: &'a UsageTracker) -> Self {
        self.assistant = Some(assistant);
        self.usage = Some(usage);
        self
    }

    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_context(mut self, ctx: FixContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    pub fn execute(&self, plan: &FixPlan) -> RunSummary {
        let mut summary = RunSummary {
            dry_run: self.mode == ExecutionMode::DryRun,
            ..RunSummary::default()
        };

        for entry in plan.entries() {
            if self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                info!("cancelled; {} file(s) left untouched", plan.entries().len() - summary.files.len());
                summary.cancelled = true;
                break;
            }

            let report = self.fix_file(entry);
            for outcome in &report.outcomes {
                if let FixOutcome::Deferred(reason) = &outcome.outcome {
                    summary.deferred.push(DeferredIssue {
                        issue: outcome.issue.clone(),
                        reason: reason.clone(),
                    });
                }
            }
            summary.files.push(report);
        }

        if let Some(usage) = self.usage {
            summary.warnings.extend(usage.warnings());
        }
        summary
    }

    fn fix_file(&self, entry: &FilePlan) -> FileReport {
        let path = entry.file_path.as_path();
        let _span = info_span!("fix_file", path = %path.display()).entered();

        let before = match self.fs.read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("cannot read file: {e}");
                return skipped_file(entry, format!("unreadable: {e}"));
            }
        };

        let mut buffer = SourceBuffer::new(&before);
        let mut outcomes = Vec::with_capacity(entry.issues.len());
        let mut whitespace_only = true;

        for planned in &entry.issues {
            let outcome = self.fix_issue(&mut buffer, planned);
            if outcome.is_fixed() {
                whitespace_only &= planned
                    .strategy
                    .mechanical()
                    .is_some_and(|fix| fix.is_whitespace_only());
            }
            debug!(rule = planned.issue.rule_code(), line = planned.issue.line_number(), ?outcome);
            outcomes.push(IssueOutcome {
                issue: planned.issue.clone(),
                outcome,
            });
        }

        let after = buffer.render();
        let attempted = entry.issues.len();
        let fixed = outcomes.iter().filter(|o| o.outcome.is_fixed()).count();
        let mut result = FixResult {
            file_path: entry.file_path.clone(),
            issues_attempted: attempted,
            issues_fixed: fixed,
            regression_detected: false,
            error: None,
        };

        if fixed == 0 || after == before {
            return FileReport {
                result,
                outcomes,
                changed: false,
            };
        }

        let profile = if whitespace_only {
            ChangeProfile::WhitespaceOnly
        } else {
            ChangeProfile::General
        };
        let verdict = self.checker.check(&before, &after, path, profile);
        if !verdict.is_safe {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "safety check failed".to_string());
            warn!("rolled back: {reason}");
            mark_fixed(&mut outcomes, FixOutcome::RolledBack(reason.clone()));
            result.issues_fixed = 0;
            result.regression_detected = true;
            result.error = Some(reason);
            return FileReport {
                result,
                outcomes,
                changed: false,
            };
        }

        if self.mode == ExecutionMode::Apply {
            if let Err(e) = self.fs.write_atomic(path, &after) {
                let reason = format!("write failed: {e}");
                warn!("{reason}");
                mark_fixed(&mut outcomes, FixOutcome::Skipped(reason.clone()));
                result.issues_fixed = 0;
                result.error = Some(reason);
                return FileReport {
                    result,
                    outcomes,
                    changed: false,
                };
            }
            info!(fixed, "file updated");
        }

        FileReport {
            result,
            outcomes,
            changed: true,
        }
    }

    fn fix_issue(&self, buffer: &mut SourceBuffer, planned: &PlannedIssue) -> FixOutcome {
        let issue = &planned.issue;
        match planned.strategy {
            FixStrategy::Mechanical(fix) => match fix.apply(buffer, issue, &self.ctx) {
                FixApplication::Applied => FixOutcome::Fixed,
                FixApplication::NotApplicable(reason) => FixOutcome::Skipped(reason),
            },
            FixStrategy::Assisted => self.assist(buffer, planned),
        }
    }

    fn assist(&self, buffer: &mut SourceBuffer, planned: &PlannedIssue) -> FixOutcome {
        let Some(assistant) = self.assistant else {
            return FixOutcome::Deferred(DeferReason::NoAssistant);
        };
        let issue = &planned.issue;
        let line = issue.line_number();
        let Some(target_line) = buffer.line(line).map(str::to_string) else {
            return FixOutcome::Skipped(format!("line {line} is out of range"));
        };

        let provider = assistant.provider().to_string();
        if let Some(usage) = self.usage {
            if !usage.can_proceed(&provider) || !usage.record_call(&provider) {
                return FixOutcome::Deferred(DeferReason::RateLimited { provider });
            }
        }

        let request = AssistRequest {
            issue: issue.clone(),
            rule_name: planned.rule_name.clone(),
            snippet: buffer.excerpt(line, self.context_lines),
            target_line,
        };
        match assistant.suggest(&request) {
            Ok(suggestion) => match apply_suggestion(buffer, line, &suggestion) {
                FixApplication::Applied => FixOutcome::Fixed,
                FixApplication::NotApplicable(reason) => FixOutcome::Skipped(reason),
            },
            Err(e) => {
                debug!(provider, "assistant failed: {e}");
                FixOutcome::Deferred(DeferReason::AssistantFailed(e.to_string()))
            }
        }
    }
}

fn mark_fixed(outcomes: &mut [IssueOutcome], replacement: FixOutcome) {
    for outcome in outcomes.iter_mut().filter(|o| o.outcome.is_fixed()) {
        outcome.outcome = replacement.clone();
    }
}

fn skipped_file(entry: &FilePlan, reason: String) -> FileReport {
    FileReport {
        result: FixResult {
            file_path: entry.file_path.clone(),
            issues_attempted: entry.issues.len(),
            issues_fixed: 0,
            regression_detected: false,
            error: Some(reason.clone()),
        },
        outcomes: entry
            .issues
            .iter()
            .map(|planned| IssueOutcome {
                issue: planned.issue.clone(),
                outcome: FixOutcome::Skipped(reason.clone()),
            })
            .collect(),
        changed: false,
    }
}

