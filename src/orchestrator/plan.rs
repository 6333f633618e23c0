use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::classifier::{RuleClassifier, Triage};
use crate::config::RulesConfig;
use crate::core::{Category, Issue};
use crate::fixers::FixStrategy;

/// A SAFE issue with its fix strategy resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedIssue {
    pub issue: Issue,
    pub strategy: FixStrategy,
    pub rule_name: String,
}

/// Everything to fix in one file, highest line first.
#[derive(Debug, Clone, Serialize)]
pub struct FilePlan {
    pub file_path: PathBuf,
    pub issues: Vec<PlannedIssue>,
}

/// Counts shown before anything is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub will_fix: usize,
    pub needs_review: usize,
    pub suggestions: usize,
    /// SAFE issues excluded by `[rules]` or `--rule`.
    pub filtered_out: usize,
    /// SAFE issues beyond `max_issues_per_run`.
    pub over_limit: usize,
    pub fixes_by_rule: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// `--rule` codes. Empty means no restriction.
    pub only_rules: Vec<String>,
    pub max_issues: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FixPlan {
    entries: Vec<FilePlan>,
    summary: PlanSummary,
}

impl FixPlan {
    /// Build the plan from classified issues. Only SAFE issues allowed by
    /// the rule settings are included; each file appears once, files in
    /// path order, issues within a file by descending line.
    pub fn build(
        triage: &Triage,
        classifier: &RuleClassifier,
        rules: &RulesConfig,
        options: &PlanOptions,
    ) -> Self {
        let mut summary = PlanSummary {
            needs_review: triage.bucket(Category::Risky).len(),
            suggestions: triage.bucket(Category::Suggest).len(),
            ..PlanSummary::default()
        };

        let mut seen = HashSet::new();
        let mut by_file: BTreeMap<PathBuf, Vec<PlannedIssue>> = BTreeMap::new();
        for classified in &triage.safe {
            let issue = &classified.issue;
            let code = issue.rule_code();
            let selected = rules.allows(code)
                && (options.only_rules.is_empty() || options.only_rules.iter().any(|r| r == code));
            if !selected {
                summary.filtered_out += 1;
                continue;
            }
            if !seen.insert(issue.clone()) {
                continue;
            }
            by_file
                .entry(issue.file_path().to_path_buf())
                .or_default()
                .push(PlannedIssue {
                    issue: issue.clone(),
                    strategy: FixStrategy::for_rule(code, issue.language()),
                    rule_name: classifier.rule_name(code, issue.language()),
                });
        }

        let mut remaining = options.max_issues.unwrap_or(usize::MAX);
        let mut entries = Vec::with_capacity(by_file.len());
        for (file_path, mut issues) in by_file {
            sort_descending(&mut issues);
            if issues.len() > remaining {
                summary.over_limit += issues.len() - remaining;
                issues.truncate(remaining);
            }
            remaining -= issues.len();
            if issues.is_empty() {
                continue;
            }
            for planned in &issues {
                *summary
                    .fixes_by_rule
                    .entry(planned.issue.rule_code().to_string())
                    .or_insert(0) += 1;
            }
            summary.will_fix += issues.len();
            entries.push(FilePlan { file_path, issues });
        }

        debug!(files = entries.len(), issues = summary.will_fix, "fix plan built");
        Self { entries, summary }
    }

    pub fn entries(&self) -> &[FilePlan] {
        &self.entries
    }

    pub fn summary(&self) -> &PlanSummary {
        &self.summary
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.entries.iter().map(|e| e.issues.len()).sum()
    }

    pub fn entry(&self, path: &Path) -> Option<&FilePlan> {
        self.entries.iter().find(|e| e.file_path == path)
    }
}

/// Highest line first; ties keep a fixed rule-code order.
fn sort_descending(issues: &mut [PlannedIssue]) {
    issues.sort_by(|a, b| {
        b.issue
            .line_number()
            .cmp(&a.issue.line_number())
            .then_with(|| a.issue.rule_code().cmp(b.issue.rule_code()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use pretty_assertions::assert_eq;

    fn issue(path: &str, line: usize, code: &str) -> Issue {
        Issue::new(path, line, code, "msg", Language::Python).unwrap()
    }

    fn plan(issues: &[Issue], rules: &RulesConfig, options: &PlanOptions) -> FixPlan {
        let classifier = RuleClassifier::new();
        let triage = classifier.group_by_category(issues);
        FixPlan::build(&triage, &classifier, rules, options)
    }

    #[test]
    fn safe_issues_grouped_per_file_in_descending_order() {
        let issues = vec![
            issue("b.py", 1, "F401"),
            issue("a.py", 5, "W291"),
            issue("b.py", 12, "E711"),
            issue("a.py", 2, "F841"),
            issue("b.py", 7, "XYZ1"),
            issue("b.py", 12, "E711"),
        ];
        let plan = plan(&issues, &RulesConfig::default(), &PlanOptions::default());

        let files: Vec<_> = plan.entries().iter().map(|e| e.file_path.clone()).collect();
        assert_eq!(files, vec![PathBuf::from("a.py"), PathBuf::from("b.py")]);

        let lines: Vec<_> = plan.entries()[1]
            .issues
            .iter()
            .map(|p| p.issue.line_number())
            .collect();
        assert_eq!(lines, vec![12, 1]);

        let summary = plan.summary();
        assert_eq!(summary.will_fix, 3);
        assert_eq!(summary.needs_review, 1);
        assert_eq!(summary.suggestions, 1);
    }

    #[test]
    fn rule_filters_and_cap_are_counted() {
        let issues = vec![
            issue("a.py", 1, "F401"),
            issue("a.py", 2, "F401"),
            issue("a.py", 3, "W291"),
            issue("b.py", 1, "F401"),
        ];
        let rules = RulesConfig {
            disabled: vec!["W291".into()],
            ..RulesConfig::default()
        };
        let options = PlanOptions {
            only_rules: vec!["F401".into(), "W291".into()],
            max_issues: Some(2),
        };
        let plan = plan(&issues, &rules, &options);

        assert_eq!(plan.issue_count(), 2);
        assert_eq!(plan.summary().filtered_out, 1);
        assert_eq!(plan.summary().over_limit, 1);
        assert!(plan.entry(Path::new("b.py")).is_none());
        assert_eq!(plan.summary().fixes_by_rule.get("F401"), Some(&2));
    }
}
