use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::Analyzer;
use crate::core::{Issue, Language};
use crate::errors::{Error, Result};

/// Rule code given to messages ESLint reports without a rule (parse failures).
pub const PARSE_ERROR_CODE: &str = "parse-error";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintFileResult {
    file_path: PathBuf,
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintMessage {
    rule_id: Option<String>,
    message: String,
    line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Invocation {
    Direct(PathBuf),
    /// `npx eslint`
    Npx(PathBuf),
}

pub struct EslintAnalyzer {
    invocation: Option<Invocation>,
}

impl EslintAnalyzer {
    /// Prefer the repository's own `node_modules/.bin/eslint`, then a global
    /// `eslint`, then `npx`.
    pub fn for_repo(repo: &Path) -> Self {
        let local = repo.join("node_modules").join(".bin").join("eslint");
        let invocation = if local.is_file() {
            Some(Invocation::Direct(local))
        } else if let Ok(global) = which::which("eslint") {
            Some(Invocation::Direct(global))
        } else {
            which::which("npx").ok().map(Invocation::Npx)
        };
        Self { invocation }
    }

    fn command(&self) -> Option<Command> {
        match self.invocation.as_ref()? {
            Invocation::Direct(program) => Some(Command::new(program)),
            Invocation::Npx(npx) => {
                let mut cmd = Command::new(npx);
                cmd.arg("eslint");
                Some(cmd)
            }
        }
    }
}

impl Analyzer for EslintAnalyzer {
    fn name(&self) -> &'static str {
        "eslint"
    }

    fn languages(&self) -> &'static [Language] {
        &[Language::JavaScript, Language::TypeScript]
    }

    fn is_available(&self) -> bool {
        self.invocation.is_some()
    }

    fn analyze(&self, repo: &Path) -> Result<Vec<Issue>> {
        let mut cmd = self
            .command()
            .ok_or_else(|| Error::analyzer(self.name(), "neither `eslint` nor `npx` found on PATH"))?;

        let output = cmd
            .args([".", "--format", "json"])
            .current_dir(repo)
            .output()
            .map_err(|e| Error::analyzer(self.name(), format!("failed to run eslint: {e}")))?;

        // Exit code 1 only means lint problems were found.
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() && !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::analyzer(
                self.name(),
                format!("eslint exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let issues = parse_eslint_output(&stdout).map_err(|m| Error::analyzer(self.name(), m))?;
        debug!(count = issues.len(), "eslint finished");
        Ok(issues)
    }
}

/// Parse `eslint --format json`. File paths are already absolute.
pub fn parse_eslint_output(stdout: &str) -> std::result::Result<Vec<Issue>, String> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let files: Vec<EslintFileResult> =
        serde_json::from_str(stdout).map_err(|e| format!("unparseable eslint output: {e}"))?;

    let mut issues = Vec::new();
    for file in files {
        let Some(language) = Language::from_path(&file.file_path).filter(|l| *l != Language::Python) else {
            debug!(path = %file.file_path.display(), "skipping non-JS/TS eslint result");
            continue;
        };
        for message in file.messages {
            let code = message
                .rule_id
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| PARSE_ERROR_CODE.to_string());
            let issue = Issue::new(
                file.file_path.clone(),
                message.line.unwrap_or(1).max(1),
                code,
                message.message,
                language,
            )
            .map_err(|e| e.to_string())?;
            issues.push(issue);
        }
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parses_results_and_languages() {
        let stdout = indoc! {r#"
            [
              {"filePath": "/repo/src/app.ts", "errorCount": 2, "messages": [
                {"ruleId": "prefer-const", "severity": 2, "message": "'a' is never reassigned.", "line": 3, "column": 5},
                {"ruleId": null, "fatal": true, "severity": 2, "message": "Parsing error: Unexpected token", "line": 9}
              ]},
              {"filePath": "/repo/lib/util.js", "messages": [
                {"ruleId": "no-extra-semi", "message": "Unnecessary semicolon.", "line": 1}
              ]},
              {"filePath": "/repo/clean.js", "messages": []}
            ]
        "#};
        let issues = parse_eslint_output(stdout).unwrap();
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].language(), Language::TypeScript);
        assert_eq!(issues[1].rule_code(), PARSE_ERROR_CODE);
        assert_eq!(issues[1].line_number(), 9);
        assert_eq!(issues[2].language(), Language::JavaScript);
    }

    #[test]
    fn malformed_output_is_an_error() {
        assert!(parse_eslint_output("Oops! Something went wrong!").is_err());
    }
}
