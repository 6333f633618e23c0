//! Default rule tables.
//!
//! Table membership is data: `[[rules.overrides]]` in the config can move any
//! code between categories or add new ones without touching this file.

use std::collections::HashMap;

use crate::config::RuleOverride;
use crate::core::{Category, Language};

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub category: Category,
    pub confidence: f64,
    pub name: String,
}

struct DefaultRule {
    code: &'static str,
    category: Category,
    confidence: f64,
    name: &'static str,
}

const fn safe(code: &'static str, name: &'static str) -> DefaultRule {
    DefaultRule {
        code,
        category: Category::Safe,
        confidence: 1.0,
        name,
    }
}

const fn risky(code: &'static str, confidence: f64, name: &'static str) -> DefaultRule {
    DefaultRule {
        code,
        category: Category::Risky,
        confidence,
        name,
    }
}

const fn suggest(code: &'static str, name: &'static str) -> DefaultRule {
    DefaultRule {
        code,
        category: Category::Suggest,
        confidence: 0.0,
        name,
    }
}

/// Ruff codes. Risky confidence reflects how often touching the rule
/// unsupervised turns out fine.
static PYTHON_RULES: &[DefaultRule] = &[
    safe("F401", "Unused import"),
    safe("F541", "f-string without placeholders"),
    safe("W291", "Trailing whitespace"),
    safe("W292", "No newline at end of file"),
    safe("W293", "Blank line contains whitespace"),
    safe("W391", "Blank line at end of file"),
    safe("E701", "Multiple statements on one line (colon)"),
    safe("E702", "Multiple statements on one line (semicolon)"),
    safe("E703", "Statement ends with a useless semicolon"),
    safe("E711", "Comparison to None"),
    safe("E712", "Comparison to True/False"),
    risky("F841", 0.5, "Unused local variable"),
    risky("F811", 0.4, "Redefinition of unused name"),
    risky("E501", 0.3, "Line too long"),
    risky("E722", 0.3, "Bare except"),
    risky("C901", 0.2, "Function too complex"),
    suggest("D100", "Missing docstring in public module"),
    suggest("D101", "Missing docstring in public class"),
    suggest("D102", "Missing docstring in public method"),
    suggest("D103", "Missing docstring in public function"),
    suggest("D104", "Missing docstring in public package"),
    suggest("D105", "Missing docstring in magic method"),
    suggest("D106", "Missing docstring in public nested class"),
    suggest("D107", "Missing docstring in __init__"),
];

/// ESLint core rules, shared by JavaScript and TypeScript.
static ESLINT_RULES: &[DefaultRule] = &[
    safe("no-trailing-spaces", "Trailing spaces"),
    safe("eol-last", "Missing newline at end of file"),
    safe("no-extra-semi", "Unnecessary semicolon"),
    safe("prefer-const", "Variable never reassigned, use const"),
    safe("no-multiple-empty-lines", "Multiple empty lines"),
    risky("no-unused-vars", 0.4, "Unused variable"),
    risky("no-var", 0.4, "var declaration"),
    risky("semi", 0.5, "Missing semicolon"),
    risky("eqeqeq", 0.3, "Loose equality"),
    risky("max-len", 0.3, "Line too long"),
    risky("complexity", 0.2, "Function too complex"),
];

/// TypeScript-specific verdicts, consulted before the shared ESLint table.
/// Core `no-unused-vars` misfires on type-only usages in TypeScript.
static TYPESCRIPT_RULES: &[DefaultRule] = &[
    risky("no-unused-vars", 0.2, "Unused variable (core rule, type-unaware)"),
    risky("@typescript-eslint/no-unused-vars", 0.4, "Unused variable"),
    suggest("@typescript-eslint/no-explicit-any", "Explicit any type"),
    suggest("no-undef", "Undefined name (checked by the compiler)"),
];

/// Rule lookup keyed by `(language, code)` with a language-agnostic fallback.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    exact: HashMap<(Language, String), RuleEntry>,
    generic: HashMap<String, RuleEntry>,
}

impl RuleTable {
    pub fn defaults() -> Self {
        let mut table = Self::default();
        for rule in PYTHON_RULES {
            table.exact.insert((Language::Python, rule.code.to_string()), entry(rule));
        }
        for rule in ESLINT_RULES {
            table.generic.insert(rule.code.to_string(), entry(rule));
        }
        for rule in TYPESCRIPT_RULES {
            table
                .exact
                .insert((Language::TypeScript, rule.code.to_string()), entry(rule));
        }
        table
    }

    /// Insert or replace one entry. A language-less override also clears
    /// language-specific defaults for that code so it applies everywhere.
    pub fn apply_override(&mut self, rule: &RuleOverride) {
        let previous_name = self
            .lookup(&rule.code, rule.language.unwrap_or(Language::Python))
            .map(|e| e.name.clone());
        let name = rule
            .name
            .clone()
            .or(previous_name)
            .unwrap_or_else(|| format!("Rule {}", rule.code));
        let confidence = match rule.category {
            Category::Safe => 1.0,
            Category::Risky => rule.confidence.unwrap_or(0.5),
            Category::Suggest => rule.confidence.unwrap_or(0.0),
        };
        let new_entry = RuleEntry {
            category: rule.category,
            confidence,
            name,
        };

        match rule.language {
            Some(language) => {
                self.exact.insert((language, rule.code.clone()), new_entry);
            }
            None => {
                self.exact.retain(|(_, code), _| code != &rule.code);
                self.generic.insert(rule.code.clone(), new_entry);
            }
        }
    }

    pub fn lookup(&self, code: &str, language: Language) -> Option<&RuleEntry> {
        self.exact
            .get(&(language, code.to_string()))
            .or_else(|| self.generic.get(code))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.generic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn entry(rule: &DefaultRule) -> RuleEntry {
    RuleEntry {
        category: rule.category,
        confidence: rule.confidence,
        name: rule.name.to_string(),
    }
}
