//! Regression detection for a file's before/after content.
//!
//! Checks run in a fixed order and stop at the first failure:
//! parseability, size sanity, then line-count monotonicity for passes made
//! only of whitespace fixes. The checker holds no state between calls.

mod syntax;

use serde::Serialize;
use std::path::Path;
use tracing::debug;

pub use syntax::{NoSyntaxCheck, SyntaxValidator, SyntaxVerdict, TreeSitterValidator};

pub const DEFAULT_MAX_SHRINK_RATIO: f64 = 0.5;

/// What kind of fixes produced the after-content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeProfile {
    /// Every applied fix only removes whitespace or blank content.
    WhitespaceOnly,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCheck {
    Parseability,
    Size,
    LineCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    pub is_safe: bool,
    pub reason: Option<String>,
    pub failed_check: Option<SafetyCheck>,
}

impl RegressionResult {
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            reason: None,
            failed_check: None,
        }
    }

    pub fn regression(check: SafetyCheck, reason: impl Into<String>) -> Self {
        Self {
            is_safe: false,
            reason: Some(reason.into()),
            failed_check: Some(check),
        }
    }
}

pub struct SafetyChecker {
    max_shrink_ratio: f64,
    validator: Box<dyn SyntaxValidator>,
}

impl Default for SafetyChecker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SHRINK_RATIO)
    }
}

impl std::fmt::Debug for SafetyChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyChecker")
            .field("max_shrink_ratio", &self.max_shrink_ratio)
            .finish_non_exhaustive()
    }
}

impl SafetyChecker {
    pub fn new(max_shrink_ratio: f64) -> Self {
        Self::with_validator(max_shrink_ratio, Box::new(TreeSitterValidator::new()))
    }

    pub fn with_validator(max_shrink_ratio: f64, validator: Box<dyn SyntaxValidator>) -> Self {
        Self {
            max_shrink_ratio,
            validator,
        }
    }

    pub fn max_shrink_ratio(&self) -> f64 {
        self.max_shrink_ratio
    }

    pub fn check(
        &self,
        before: &str,
        after: &str,
        path: &Path,
        profile: ChangeProfile,
    ) -> RegressionResult {
        let result = self
            .check_parseability(after, path)
            .or_else(|| self.check_size(before, after))
            .or_else(|| check_line_count(before, after, profile))
            .unwrap_or_else(RegressionResult::safe);

        if let Some(reason) = &result.reason {
            debug!(path = %path.display(), reason, "safety check failed");
        }
        result
    }

    fn check_parseability(&self, after: &str, path: &Path) -> Option<RegressionResult> {
        match self.validator.validate(after, path) {
            SyntaxVerdict::Invalid(detail) => Some(RegressionResult::regression(
                SafetyCheck::Parseability,
                format!("file no longer parses: {detail}"),
            )),
            SyntaxVerdict::Valid | SyntaxVerdict::Unsupported => None,
        }
    }

    fn check_size(&self, before: &str, after: &str) -> Option<RegressionResult> {
        if before.is_empty() {
            return None;
        }
        if after.trim().is_empty() && !before.trim().is_empty() {
            return Some(RegressionResult::regression(
                SafetyCheck::Size,
                "file was emptied",
            ));
        }
        let removed = before.len().saturating_sub(after.len());
        let shrink = removed as f64 / before.len() as f64;
        if shrink > self.max_shrink_ratio {
            return Some(RegressionResult::regression(
                SafetyCheck::Size,
                format!(
                    "file shrank by {:.0}% (limit {:.0}%)",
                    shrink * 100.0,
                    self.max_shrink_ratio * 100.0
                ),
            ));
        }
        None
    }
}

fn check_line_count(before: &str, after: &str, profile: ChangeProfile) -> Option<RegressionResult> {
    if profile != ChangeProfile::WhitespaceOnly {
        return None;
    }
    let (before_lines, after_lines) = (before.lines().count(), after.lines().count());
    (after_lines > before_lines).then(|| {
        RegressionResult::regression(
            SafetyCheck::LineCount,
            format!("whitespace fix grew the file from {before_lines} to {after_lines} lines"),
        )
    })
}
