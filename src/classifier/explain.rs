//! Human-readable explanations of what a fix does and why it is (or is not)
//! safe to apply unattended.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub title: String,
    pub description: String,
    pub why: String,
    pub impact: String,
}

struct Entry {
    code: &'static str,
    title: &'static str,
    description: &'static str,
    why: &'static str,
    impact: &'static str,
}

static EXPLANATIONS: &[Entry] = &[
    Entry {
        code: "F401",
        title: "Removed unused import",
        description: "Module imported but never used in code",
        why: "Code that is not referenced cannot affect behavior",
        impact: "Reduces clutter and import time",
    },
    Entry {
        code: "F541",
        title: "Fixed useless f-string",
        description: "f-string without placeholders",
        why: "Replacing f\"text\" with \"text\" has identical behavior",
        impact: "Removes unnecessary formatting overhead",
    },
    Entry {
        code: "W291",
        title: "Removed trailing whitespace",
        description: "Extra spaces at end of line",
        why: "Whitespace at the end of a line has no effect on code",
        impact: "Cleaner diffs",
    },
    Entry {
        code: "W293",
        title: "Cleared whitespace-only line",
        description: "Blank line contains spaces or tabs",
        why: "Whitespace on an empty line has no effect on code",
        impact: "Cleaner diffs",
    },
    Entry {
        code: "W292",
        title: "Added newline at end of file",
        description: "Files should end with a newline",
        why: "POSIX convention, no effect on behavior",
        impact: "Prevents warnings from many tools",
    },
    Entry {
        code: "W391",
        title: "Removed blank lines at end of file",
        description: "File ends with extra blank lines",
        why: "Trailing blank lines have no effect on code",
        impact: "Consistent file endings",
    },
    Entry {
        code: "E702",
        title: "Split statements onto separate lines",
        description: "Several statements joined with semicolons",
        why: "Each statement keeps its order and indentation",
        impact: "One statement per line is easier to read and debug",
    },
    Entry {
        code: "E703",
        title: "Removed useless semicolon",
        description: "Statement ends with a semicolon",
        why: "A trailing semicolon is ignored by the interpreter",
        impact: "Idiomatic Python",
    },
    Entry {
        code: "E711",
        title: "Fixed None comparison",
        description: "Should use `is None` instead of `== None`",
        why: "`is` checks identity; `==` can be overridden",
        impact: "More predictable comparisons, follows PEP 8",
    },
    Entry {
        code: "E712",
        title: "Fixed True/False comparison",
        description: "Should use `is True`/`is False` instead of `==`",
        why: "Identity comparison against singletons cannot be overridden",
        impact: "Follows PEP 8",
    },
    Entry {
        code: "F841",
        title: "Unused variable assignment",
        description: "Variable assigned but never used",
        why: "Might be intentional, the right-hand side may have side effects",
        impact: "Could indicate incomplete logic or a debugging leftover",
    },
    Entry {
        code: "E501",
        title: "Line too long",
        description: "Line exceeds the character limit",
        why: "Requires manual refactoring decisions",
        impact: "Affects readability on narrow screens",
    },
    Entry {
        code: "C901",
        title: "Function too complex",
        description: "Cyclomatic complexity above the configured limit",
        why: "Splitting a function changes structure and needs review",
        impact: "Complex functions are harder to test",
    },
    Entry {
        code: "no-trailing-spaces",
        title: "Removed trailing spaces",
        description: "Extra spaces at end of line",
        why: "Whitespace at the end of a line has no effect on code",
        impact: "Cleaner diffs",
    },
    Entry {
        code: "eol-last",
        title: "Added newline at end of file",
        description: "Files should end with a newline",
        why: "No effect on behavior",
        impact: "Consistent file endings",
    },
    Entry {
        code: "prefer-const",
        title: "Declared with const",
        description: "`let` binding is never reassigned",
        why: "The linter proved the binding is never reassigned",
        impact: "Signals intent to readers",
    },
];

/// Explanation for a rule code; unknown codes get a generic entry.
pub fn explain(rule_code: &str) -> Explanation {
    EXPLANATIONS
        .iter()
        .find(|e| e.code == rule_code)
        .map(|e| Explanation {
            title: e.title.to_string(),
            description: e.description.to_string(),
            why: e.why.to_string(),
            impact: e.impact.to_string(),
        })
        .unwrap_or_else(|| Explanation {
            title: format!("Rule {rule_code}"),
            description: "Code quality issue".to_string(),
            why: "Unknown".to_string(),
            impact: "See the analyzer documentation".to_string(),
        })
}
