//! Shared data model: languages, analyzer issues and safety classifications.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::JavaScript, Language::TypeScript];

    pub fn from_extension(ext: &str) -> Option<Self> {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[
            (&["py", "pyi"], Language::Python),
            (&["js", "jsx", "mjs", "cjs"], Language::JavaScript),
            (&["ts", "tsx", "mts", "cts"], Language::TypeScript),
        ];

        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, lang)| *lang)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse a user-supplied language name (`python`, `js`, `ts`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display_str = match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
        };
        write!(f, "{display_str}")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IssueError {
    #[error("issue in {0} has an empty rule code")]
    EmptyRuleCode(PathBuf),
    #[error("issue {code} in {path} has line number 0")]
    ZeroLine { code: String, path: PathBuf },
}

/// One finding reported by an external analyzer. Immutable once built.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Issue {
    file_path: PathBuf,
    line_number: usize,
    rule_code: String,
    message: String,
    language: Language,
}

impl Issue {
    pub fn new(
        file_path: impl Into<PathBuf>,
        line_number: usize,
        rule_code: impl Into<String>,
        message: impl Into<String>,
        language: Language,
    ) -> Result<Self, IssueError> {
        let file_path = file_path.into();
        let rule_code = rule_code.into();
        if rule_code.trim().is_empty() {
            return Err(IssueError::EmptyRuleCode(file_path));
        }
        if line_number == 0 {
            return Err(IssueError::ZeroLine {
                code: rule_code,
                path: file_path,
            });
        }
        Ok(Self {
            file_path,
            line_number,
            rule_code,
            message: message.into(),
            language,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn rule_code(&self) -> &str {
        &self.rule_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Safe,
    Risky,
    Suggest,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Safe => "safe",
            Category::Risky => "risky",
            Category::Suggest => "suggest",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Safety verdict for one rule code.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Classification {
    pub category: Category,
    /// Review-priority hint in `[0, 1]`; always `1.0` for SAFE.
    pub confidence: f64,
    pub reason: String,
}

impl Classification {
    pub fn safe(reason: impl Into<String>) -> Self {
        Self {
            category: Category::Safe,
            confidence: 1.0,
            reason: reason.into(),
        }
    }

    pub fn risky(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            category: Category::Risky,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }

    pub fn suggest(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            category: Category::Suggest,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }

    pub fn is_safe(&self) -> bool {
        self.category == Category::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_detection_from_extension() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("rs"), None);
    }

    #[test]
    fn issue_rejects_empty_code_and_line_zero() {
        assert!(matches!(
            Issue::new("a.py", 1, "  ", "msg", Language::Python),
            Err(IssueError::EmptyRuleCode(_))
        ));
        assert!(matches!(
            Issue::new("a.py", 0, "F401", "msg", Language::Python),
            Err(IssueError::ZeroLine { .. })
        ));
        assert!(Issue::new("a.py", 1, "F401", "msg", Language::Python).is_ok());
    }

    #[test]
    fn safe_classification_has_full_confidence() {
        assert_eq!(Classification::safe("x").confidence, 1.0);
        assert_eq!(Classification::risky(1.7, "x").confidence, 1.0);
        assert_eq!(Classification::suggest(-0.2, "x").confidence, 0.0);
    }
}
