use crate::assist::review::{FileReview, ReviewOutcome};
use crate::classifier::RuleReport;
use crate::core::Category;
use crate::orchestrator::{FixOutcome, RunSummary};
use crate::pipeline::RunReport;
use crate::run_log::{RunMode, RunStats};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;
use std::io::Write;

/// Review items shown in the terminal before the list is cut off.
const REVIEW_PREVIEW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Terminal,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &RunReport) -> anyhow::Result<()>;
    fn write_stats(&mut self, stats: &RunStats, skipped_lines: usize) -> anyhow::Result<()>;
    fn write_rule(&mut self, rule: &RuleReport) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_value(&mut self, value: &impl Serialize) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(self.writer, "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct StatsDocument<'a> {
    #[serde(flatten)]
    stats: &'a RunStats,
    skipped_lines: usize,
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &RunReport) -> anyhow::Result<()> {
        self.write_value(report)
    }

    fn write_stats(&mut self, stats: &RunStats, skipped_lines: usize) -> anyhow::Result<()> {
        self.write_value(&StatsDocument {
            stats,
            skipped_lines,
        })
    }

    fn write_rule(&mut self, rule: &RuleReport) -> anyhow::Result<()> {
        self.write_value(rule)
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_header(&mut self, title: &str) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", title.bold().blue())?;
        writeln!(self.writer, "{}", "=".repeat(title.len()).blue())?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_overview(&mut self, report: &RunReport) -> anyhow::Result<()> {
        writeln!(self.writer, "Repository: {}", report.repository.display())?;
        let languages: Vec<String> = report
            .languages
            .iter()
            .map(|(language, files)| format!("{language} ({files} files)"))
            .collect();
        if languages.is_empty() {
            writeln!(self.writer, "Languages:  none detected")?;
        } else {
            writeln!(self.writer, "Languages:  {}", languages.join(", "))?;
        }
        writeln!(self.writer, "Issues:     {}", report.issues_found)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_triage(&mut self, report: &RunReport) -> anyhow::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Category", "Rule", "Count"]);
        for (category, counts) in &report.triage.by_rule {
            for (rule, count) in counts {
                table.add_row(vec![category.to_string(), rule.clone(), count.to_string()]);
            }
        }
        writeln!(
            self.writer,
            "Classification: {} safe, {} risky, {} suggest",
            report.triage.safe.to_string().green(),
            report.triage.risky.to_string().yellow(),
            report.triage.suggest.to_string().cyan()
        )?;
        if !report.triage.by_rule.is_empty() {
            writeln!(self.writer, "{table}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_plan(&mut self, report: &RunReport) -> anyhow::Result<()> {
        let plan = &report.plan;
        writeln!(self.writer, "{}", "Fix plan".bold())?;
        writeln!(self.writer, "  Will fix:      {}", plan.will_fix)?;
        writeln!(self.writer, "  Needs review:  {}", plan.needs_review)?;
        writeln!(self.writer, "  Suggestions:   {}", plan.suggestions)?;
        if plan.filtered_out > 0 {
            writeln!(self.writer, "  Filtered out:  {}", plan.filtered_out)?;
        }
        if plan.over_limit > 0 {
            writeln!(self.writer, "  Over limit:    {}", plan.over_limit)?;
        }
        for (rule, count) in &plan.fixes_by_rule {
            writeln!(self.writer, "    {rule}: {count}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_review_queue(&mut self, report: &RunReport) -> anyhow::Result<()> {
        if report.review_queue.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{}", "Needs review".bold().yellow())?;
        for classified in report.review_queue.iter().take(REVIEW_PREVIEW) {
            let issue = &classified.issue;
            writeln!(
                self.writer,
                "  {}:{} {} {} ({:.0}%)",
                issue.file_path().display(),
                issue.line_number(),
                issue.rule_code().yellow(),
                issue.message(),
                classified.classification.confidence * 100.0
            )?;
        }
        if report.review_queue.len() > REVIEW_PREVIEW {
            writeln!(
                self.writer,
                "  ... and {} more",
                report.review_queue.len() - REVIEW_PREVIEW
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_results(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        let title = if summary.dry_run {
            "Dry run (nothing written)"
        } else {
            "Results"
        };
        writeln!(self.writer, "{}", title.bold())?;

        for file in &summary.files {
            let path = file.result.file_path.display();
            if file.result.regression_detected {
                let reason = file.result.error.as_deref().unwrap_or("safety check failed");
                writeln!(self.writer, "  {} {path}: rolled back ({reason})", "✗".red())?;
            } else if let Some(error) = &file.result.error {
                writeln!(self.writer, "  {} {path}: {error}", "!".yellow())?;
            } else if file.changed {
                writeln!(
                    self.writer,
                    "  {} {path}: {} fixed",
                    "✓".green(),
                    file.result.issues_fixed
                )?;
            }
            for outcome in &file.outcomes {
                if let FixOutcome::Skipped(reason) = &outcome.outcome {
                    if file.result.error.is_none() {
                        writeln!(
                            self.writer,
                            "      line {} {}: skipped ({reason})",
                            outcome.issue.line_number(),
                            outcome.issue.rule_code()
                        )?;
                    }
                }
            }
        }

        for deferred in &summary.deferred {
            writeln!(
                self.writer,
                "  {} {}:{} {}: {}",
                "→".cyan(),
                deferred.issue.file_path().display(),
                deferred.issue.line_number(),
                deferred.issue.rule_code(),
                deferred.reason
            )?;
        }

        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "  Fixed: {}  Deferred: {}  Skipped: {}  Rolled back: {}",
            summary.issues_fixed().to_string().green(),
            summary.issues_deferred(),
            summary.issues_skipped(),
            summary.files_rolled_back().to_string().red()
        )?;
        if summary.cancelled {
            writeln!(self.writer, "  {}", "Cancelled before all files were processed".yellow())?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_reviews(&mut self, reviews: &[FileReview]) -> anyhow::Result<()> {
        if reviews.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{}", "AI review".bold().magenta())?;
        for review in reviews {
            let path = review.file_path.display();
            match &review.outcome {
                ReviewOutcome::Suggestions { text } => {
                    writeln!(self.writer, "  {path} ({} finding(s))", review.findings)?;
                    for line in text.lines() {
                        writeln!(self.writer, "    {line}")?;
                    }
                }
                ReviewOutcome::RateLimited { provider } => {
                    writeln!(self.writer, "  {} {path}: {provider} rate limit reached", "→".cyan())?;
                }
                ReviewOutcome::Failed { error } => {
                    writeln!(self.writer, "  {} {path}: {error}", "!".yellow())?;
                }
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_warnings(&mut self, warnings: &[String]) -> anyhow::Result<()> {
        for warning in warnings {
            writeln!(self.writer, "{} {warning}", "warning:".yellow().bold())?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &RunReport) -> anyhow::Result<()> {
        self.write_header(&format!("Lintpilot ({})", report.mode))?;
        self.write_overview(report)?;
        self.write_triage(report)?;
        self.write_plan(report)?;
        self.write_review_queue(report)?;
        if let Some(summary) = &report.summary {
            self.write_results(summary)?;
        } else if report.mode == RunMode::Analyze && report.plan.will_fix > 0 {
            writeln!(
                self.writer,
                "Run with --apply to fix {} issue(s), or --dry-run to preview.",
                report.plan.will_fix
            )?;
            writeln!(self.writer)?;
        }
        self.write_reviews(&report.reviews)?;
        self.write_warnings(&report.warnings)?;
        writeln!(self.writer, "Finished in {:.2}s", report.duration_seconds)?;
        Ok(())
    }

    fn write_stats(&mut self, stats: &RunStats, skipped_lines: usize) -> anyhow::Result<()> {
        self.write_header("Lintpilot run history")?;
        if stats.total_runs == 0 {
            writeln!(self.writer, "No runs recorded yet.")?;
            return Ok(());
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
        table.add_row(vec!["Total runs".to_string(), stats.total_runs.to_string()]);
        table.add_row(vec!["Issues found".to_string(), stats.total_issues_found.to_string()]);
        table.add_row(vec!["Fixes applied".to_string(), stats.total_fixes_applied.to_string()]);
        table.add_row(vec!["Deferred".to_string(), stats.total_deferred.to_string()]);
        table.add_row(vec!["Files rolled back".to_string(), stats.files_rolled_back.to_string()]);
        table.add_row(vec!["Errors".to_string(), stats.total_errors.to_string()]);
        table.add_row(vec![
            "Average duration".to_string(),
            format!("{:.2}s", stats.average_duration_seconds),
        ]);
        table.add_row(vec!["Success rate".to_string(), format!("{:.1}%", stats.success_rate)]);
        if let Some(last) = stats.last_run {
            table.add_row(vec![
                "Last run".to_string(),
                last.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ]);
        }
        writeln!(self.writer, "{table}")?;

        if skipped_lines > 0 {
            self.write_warnings(&[format!("{skipped_lines} unreadable line(s) in the run log were skipped")])?;
        }
        Ok(())
    }

    fn write_rule(&mut self, rule: &RuleReport) -> anyhow::Result<()> {
        let classification = &rule.classification;
        let category = match classification.category {
            Category::Safe => classification.category.to_string().green(),
            Category::Risky => classification.category.to_string().yellow(),
            Category::Suggest => classification.category.to_string().cyan(),
        };
        writeln!(self.writer, "{} ({}) {}", rule.code.bold().blue(), rule.language, rule.name.bold())?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "  Category:   {category} (confidence {:.2})",
            classification.confidence
        )?;
        writeln!(self.writer, "  Verdict:    {}", classification.reason)?;
        if classification.is_safe() {
            let how = if rule.mechanical_fix {
                "mechanical"
            } else {
                "AI-assisted, deferred when no provider is configured"
            };
            writeln!(self.writer, "  Fix:        {how}")?;
        }
        let explanation = &rule.explanation;
        writeln!(self.writer, "  What:       {}", explanation.description)?;
        writeln!(self.writer, "  Why:        {}", explanation.why)?;
        writeln!(self.writer, "  Impact:     {}", explanation.impact)?;
        Ok(())
    }
}

pub fn create_writer(format: OutputFormat) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(std::io::stdout())),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(std::io::stdout())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifiedIssue, RuleClassifier};
    use crate::core::{Classification, Issue, Language};
    use crate::orchestrator::{FileReport, FixResult, IssueOutcome, PlanSummary};
    use crate::pipeline::TriageCounts;
    use crate::run_log::RunStatus;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn report(summary: Option<RunSummary>) -> RunReport {
        let issue = Issue::new("/r/a.py", 3, "F841", "unused variable", Language::Python).unwrap();
        RunReport {
            repository: PathBuf::from("/r"),
            mode: if summary.is_some() { RunMode::Apply } else { RunMode::Analyze },
            status: RunStatus::Completed,
            languages: BTreeMap::from([(Language::Python, 2)]),
            issues_found: 2,
            triage: TriageCounts {
                safe: 1,
                risky: 1,
                ..TriageCounts::default()
            },
            review_queue: vec![ClassifiedIssue {
                issue,
                classification: Classification::risky(0.6, "may have side effects"),
            }],
            plan: PlanSummary {
                will_fix: 1,
                needs_review: 1,
                ..PlanSummary::default()
            },
            summary,
            reviews: vec![],
            warnings: vec!["eslint not found".into()],
            duration_seconds: 0.25,
        }
    }

    fn render(report: &RunReport) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        TerminalWriter::new(&mut out).write_report(report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn analyze_report_lists_review_items_and_hint() {
        let text = render(&report(None));
        assert!(text.contains("Lintpilot (analyze)"));
        assert!(text.contains("Will fix:      1"));
        assert!(text.contains("/r/a.py:3 F841 unused variable (60%)"));
        assert!(text.contains("Run with --apply"));
        assert!(text.contains("warning: eslint not found"));
    }

    #[test]
    fn apply_report_shows_file_results() {
        let issue = Issue::new("/r/b.py", 1, "W291", "Trailing whitespace", Language::Python).unwrap();
        let summary = RunSummary {
            files: vec![FileReport {
                result: FixResult {
                    file_path: PathBuf::from("/r/b.py"),
                    issues_attempted: 1,
                    issues_fixed: 1,
                    regression_detected: false,
                    error: None,
                },
                outcomes: vec![IssueOutcome {
                    issue,
                    outcome: FixOutcome::Fixed,
                }],
                changed: true,
            }],
            ..RunSummary::default()
        };
        let text = render(&report(Some(summary)));
        assert!(text.contains("/r/b.py: 1 fixed"));
        assert!(text.contains("Fixed: 1"));
        assert!(!text.contains("Run with --apply"));
    }

    #[test]
    fn reviews_are_listed_after_results() {
        let mut report = report(None);
        report.reviews = vec![
            FileReview {
                file_path: PathBuf::from("/r/a.py"),
                findings: 1,
                outcome: ReviewOutcome::Suggestions {
                    text: "1. Catch a specific exception\n2. Rename x".into(),
                },
            },
            FileReview {
                file_path: PathBuf::from("/r/c.py"),
                findings: 2,
                outcome: ReviewOutcome::RateLimited {
                    provider: "groq".into(),
                },
            },
        ];
        let text = render(&report);
        assert!(text.contains("AI review"));
        assert!(text.contains("    2. Rename x"));
        assert!(text.contains("/r/c.py: groq rate limit reached"));

        let mut out = Vec::new();
        JsonWriter::new(&mut out).write_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["reviews"][0]["status"], "suggestions");
        assert_eq!(value["reviews"][1]["provider"], "groq");
    }

    #[test]
    fn json_report_is_one_document() {
        let mut out = Vec::new();
        JsonWriter::new(&mut out).write_report(&report(None)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["issues_found"], 2);
        assert_eq!(value["mode"], "analyze");
        assert_eq!(value["plan"]["will_fix"], 1);
    }

    #[test]
    fn rule_renders_in_both_formats() {
        let rule = RuleClassifier::new().describe("F401", Language::Python);
        let mut out = Vec::new();
        JsonWriter::new(&mut out).write_rule(&rule).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["code"], "F401");
        assert_eq!(value["classification"]["category"], "safe");
        assert_eq!(value["explanation"]["title"], "Removed unused import");

        colored::control::set_override(false);
        let mut out = Vec::new();
        TerminalWriter::new(&mut out).write_rule(&rule).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Fix:        mechanical"));
        assert!(text.contains("Why:"));
    }
}
