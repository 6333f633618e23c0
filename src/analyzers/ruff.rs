use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::Analyzer;
use crate::core::{Issue, Language};
use crate::errors::{Error, Result};

/// Rule code given to diagnostics Ruff reports without one (syntax errors).
pub const SYNTAX_ERROR_CODE: &str = "invalid-syntax";

#[derive(Debug, Deserialize)]
struct RuffDiagnostic {
    code: Option<String>,
    message: String,
    filename: PathBuf,
    location: RuffLocation,
}

#[derive(Debug, Deserialize)]
struct RuffLocation {
    row: usize,
}

pub struct RuffAnalyzer {
    program: Option<PathBuf>,
}

impl RuffAnalyzer {
    pub fn new() -> Self {
        Self {
            program: which::which("ruff").ok(),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }
}

impl Default for RuffAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for RuffAnalyzer {
    fn name(&self) -> &'static str {
        "ruff"
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::Python]
    }

    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn is_required(&self) -> bool {
        true
    }

    fn analyze(&self, repo: &Path) -> Result<Vec<Issue>> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| Error::analyzer(self.name(), "`ruff` not found on PATH"))?;

        let output = Command::new(program)
            .args(["check", ".", "--output-format", "json", "--exit-zero"])
            .current_dir(repo)
            .output()
            .map_err(|e| Error::analyzer(self.name(), format!("failed to run ruff: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::analyzer(
                self.name(),
                format!("ruff exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let issues = parse_ruff_output(&stdout, repo).map_err(|m| Error::analyzer(self.name(), m))?;
        debug!(count = issues.len(), "ruff finished");
        Ok(issues)
    }
}

/// Parse `ruff check --output-format json`. Relative filenames are joined
/// onto `repo`.
pub fn parse_ruff_output(stdout: &str, repo: &Path) -> std::result::Result<Vec<Issue>, String> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let diagnostics: Vec<RuffDiagnostic> =
        serde_json::from_str(stdout).map_err(|e| format!("unparseable ruff output: {e}"))?;

    let mut issues = Vec::with_capacity(diagnostics.len());
    for diagnostic in diagnostics {
        let path = repo.join(&diagnostic.filename);
        if Language::from_path(&path) != Some(Language::Python) {
            debug!(path = %path.display(), "skipping non-Python ruff diagnostic");
            continue;
        }
        let code = diagnostic
            .code
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| SYNTAX_ERROR_CODE.to_string());
        let issue = Issue::new(
            path,
            diagnostic.location.row.max(1),
            code,
            diagnostic.message,
            Language::Python,
        )
        .map_err(|e| e.to_string())?;
        issues.push(issue);
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_diagnostics_and_normalizes_edges() {
        let stdout = indoc! {r#"
            [
              {"code": "F401", "message": "`os` imported but unused", "filename": "pkg/a.py",
               "location": {"row": 1, "column": 8}, "fix": null, "url": "https://docs"},
              {"code": null, "message": "SyntaxError: unexpected indent", "filename": "/abs/b.py",
               "location": {"row": 0, "column": 0}},
              {"code": "E501", "message": "Line too long", "filename": "nb.ipynb",
               "location": {"row": 3, "column": 1}}
            ]
        "#};
        let issues = parse_ruff_output(stdout, Path::new("/repo")).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].file_path(), Path::new("/repo/pkg/a.py"));
        assert_eq!(issues[0].rule_code(), "F401");
        assert_eq!(issues[1].file_path(), Path::new("/abs/b.py"));
        assert_eq!(issues[1].rule_code(), SYNTAX_ERROR_CODE);
        assert_eq!(issues[1].line_number(), 1);
    }

    #[test]
    fn empty_output_means_no_issues_and_garbage_is_an_error() {
        assert!(parse_ruff_output("  \n", Path::new("/repo")).unwrap().is_empty());
        assert!(parse_ruff_output("error: failed to parse", Path::new("/repo")).is_err());
    }
}
