//! Rule classifier: maps an analyzer rule code to SAFE / RISKY / SUGGEST.
//!
//! Classification is a pure function of `(rule_code, language)` over an
//! immutable table, so a single [`RuleClassifier`] can be shared freely.
//! Codes missing from every table are always SUGGEST: an unknown rule is
//! surfaced for a human and never auto-fixed.

pub mod explain;
pub mod tables;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::RuleOverride;
use crate::core::{Category, Classification, Issue, Language};
use crate::fixers::FixStrategy;
pub use explain::{explain, Explanation};
pub use tables::{RuleEntry, RuleTable};

/// Confidence given to codes found in no table.
pub const UNKNOWN_RULE_CONFIDENCE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct RuleClassifier {
    table: RuleTable,
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleClassifier {
    pub fn new() -> Self {
        Self {
            table: RuleTable::defaults(),
        }
    }

    /// Defaults with config overrides applied in order.
    pub fn with_overrides(overrides: &[RuleOverride]) -> Self {
        let mut table = RuleTable::defaults();
        for rule in overrides {
            table.apply_override(rule);
        }
        Self { table }
    }

    pub fn classify(&self, rule_code: &str, language: Language) -> Classification {
        let code = rule_code.trim();
        match self.table.lookup(code, language) {
            Some(entry) => match entry.category {
                Category::Safe => Classification::safe(format!("{}: safe to auto-fix", entry.name)),
                Category::Risky => Classification::risky(
                    entry.confidence,
                    format!("{}: needs human review", entry.name),
                ),
                Category::Suggest => Classification::suggest(
                    entry.confidence,
                    format!("{}: informational only", entry.name),
                ),
            },
            None => Classification::suggest(
                UNKNOWN_RULE_CONFIDENCE,
                if code.is_empty() {
                    "Empty rule code: never auto-fixed".to_string()
                } else {
                    format!("Unknown rule {code}: never auto-fixed")
                },
            ),
        }
    }

    pub fn rule_name(&self, rule_code: &str, language: Language) -> String {
        self.table
            .lookup(rule_code, language)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| format!("Rule {rule_code}"))
    }

    /// Everything known about one rule, for the `explain` command.
    pub fn describe(&self, rule_code: &str, language: Language) -> RuleReport {
        let code = rule_code.trim();
        let classification = self.classify(code, language);
        let mechanical_fix = classification.is_safe()
            && FixStrategy::for_rule(code, language).mechanical().is_some();
        RuleReport {
            code: code.to_string(),
            language,
            name: self.rule_name(code, language),
            classification,
            mechanical_fix,
            explanation: explain(code),
        }
    }

    /// Split issues into the three categories, keeping analyzer order.
    pub fn group_by_category(&self, issues: &[Issue]) -> Triage {
        let mut triage = Triage::default();
        for issue in issues {
            let classification = self.classify(issue.rule_code(), issue.language());
            let bucket = match classification.category {
                Category::Safe => &mut triage.safe,
                Category::Risky => &mut triage.risky,
                Category::Suggest => &mut triage.suggest,
            };
            bucket.push(ClassifiedIssue {
                issue: issue.clone(),
                classification,
            });
        }
        triage
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    pub code: String,
    pub language: Language,
    pub name: String,
    pub classification: Classification,
    /// Fixed without an AI assistant.
    pub mechanical_fix: bool,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedIssue {
    pub issue: Issue,
    pub classification: Classification,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Triage {
    pub safe: Vec<ClassifiedIssue>,
    pub risky: Vec<ClassifiedIssue>,
    pub suggest: Vec<ClassifiedIssue>,
}

impl Triage {
    pub fn total(&self) -> usize {
        self.safe.len() + self.risky.len() + self.suggest.len()
    }

    pub fn bucket(&self, category: Category) -> &[ClassifiedIssue] {
        match category {
            Category::Safe => &self.safe,
            Category::Risky => &self.risky,
            Category::Suggest => &self.suggest,
        }
    }

    /// Issue count per rule code within one category.
    pub fn counts_by_rule(&self, category: Category) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for classified in self.bucket(category) {
            *counts
                .entry(classified.issue.rule_code().to_string())
                .or_insert(0) += 1;
        }
        counts
    }

    /// Risky and suggested issues, most promising review candidates first.
    pub fn review_queue(&self) -> Vec<&ClassifiedIssue> {
        let mut queue: Vec<&ClassifiedIssue> = self.risky.iter().chain(&self.suggest).collect();
        queue.sort_by(|a, b| {
            b.classification
                .confidence
                .total_cmp(&a.classification.confidence)
        });
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn issue(code: &str, line: usize) -> Issue {
        Issue::new("src/app.py", line, code, "msg", Language::Python).unwrap()
    }

    #[test]
    fn classifies_known_codes() {
        let classifier = RuleClassifier::new();
        assert_eq!(
            classifier.classify("F401", Language::Python).category,
            Category::Safe
        );
        assert_eq!(
            classifier.classify("E711", Language::Python).category,
            Category::Safe
        );

        let unused_var = classifier.classify("F841", Language::Python);
        let long_line = classifier.classify("E501", Language::Python);
        assert_eq!(unused_var.category, Category::Risky);
        assert_eq!(long_line.category, Category::Risky);
        assert!(unused_var.confidence > long_line.confidence);

        assert_eq!(
            classifier.classify("D103", Language::Python).category,
            Category::Suggest
        );
    }

    #[test]
    fn unknown_and_empty_codes_are_suggest() {
        let classifier = RuleClassifier::new();
        let unknown = classifier.classify("X999", Language::Python);
        assert_eq!(unknown.category, Category::Suggest);
        assert_eq!(unknown.confidence, UNKNOWN_RULE_CONFIDENCE);
        assert_eq!(
            classifier.classify("", Language::JavaScript).category,
            Category::Suggest
        );
    }

    #[test]
    fn overrides_move_codes_between_categories() {
        let classifier = RuleClassifier::with_overrides(&[RuleOverride {
            code: "E501".into(),
            language: Some(Language::Python),
            category: Category::Suggest,
            confidence: Some(0.05),
            name: None,
        }]);
        let verdict = classifier.classify("E501", Language::Python);
        assert_eq!(verdict.category, Category::Suggest);
        assert_eq!(verdict.confidence, 0.05);
        assert!(verdict.reason.starts_with("Line too long"));
    }

    #[test]
    fn triage_groups_and_counts() {
        let classifier = RuleClassifier::new();
        let issues = vec![
            issue("F401", 1),
            issue("F401", 2),
            issue("E501", 3),
            issue("D100", 1),
            issue("Q000", 9),
        ];
        let triage = classifier.group_by_category(&issues);
        assert_eq!(triage.total(), 5);
        assert_eq!(triage.safe.len(), 2);
        assert_eq!(triage.counts_by_rule(Category::Safe)["F401"], 2);
        assert_eq!(triage.suggest.len(), 2);

        let queue = triage.review_queue();
        assert_eq!(queue[0].issue.rule_code(), "E501");
    }

    #[test]
    fn describe_reports_fix_strategy() {
        let classifier = RuleClassifier::new();
        let f401 = classifier.describe("F401", Language::Python);
        assert!(f401.mechanical_fix);
        assert_eq!(f401.explanation.title, "Removed unused import");

        let e701 = classifier.describe("E701", Language::Python);
        assert!(e701.classification.is_safe());
        assert!(!e701.mechanical_fix);

        assert!(!classifier.describe("F841", Language::Python).mechanical_fix);
    }

    fn language_strategy() -> impl Strategy<Value = Language> {
        prop::sample::select(Language::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(code in "[A-Za-z@/-]{0,12}[0-9]{0,4}", language in language_strategy()) {
            let classifier = RuleClassifier::new();
            prop_assert_eq!(classifier.classify(&code, language), classifier.classify(&code, language));
        }

        #[test]
        fn codes_outside_the_tables_are_never_safe(code in "ZZ[0-9]{1,5}", language in language_strategy()) {
            let classifier = RuleClassifier::new();
            prop_assert_eq!(classifier.classify(&code, language).category, Category::Suggest);
        }
    }
}
