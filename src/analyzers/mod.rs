//! External analyzer collaborators (Ruff, ESLint) and language detection.
//!
//! Analyzers are black boxes: they run a tool in the repository and turn
//! its JSON output into [`Issue`]s. A missing required analyzer, or output
//! that cannot be parsed, aborts the run before anything is touched.

pub mod detect;
pub mod eslint;
pub mod ruff;

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::core::{Issue, Language};
use crate::errors::{Error, Result};
pub use detect::{detect_languages, SourceWalker};
pub use eslint::EslintAnalyzer;
pub use ruff::RuffAnalyzer;

pub trait Analyzer {
    fn name(&self) -> &'static str;

    fn languages(&self) -> &'static [Language];

    fn is_available(&self) -> bool;

    /// When unavailable, a required analyzer fails the run; an optional one
    /// only skips its languages.
    fn is_required(&self) -> bool {
        false
    }

    fn analyze(&self, repo: &Path) -> Result<Vec<Issue>>;
}

#[derive(Debug, Default)]
pub struct AnalysisOutput {
    pub issues: Vec<Issue>,
    pub warnings: Vec<String>,
    pub analyzers_run: Vec<&'static str>,
}

/// The analyzers for a repository, found on PATH.
pub fn default_analyzers(repo: &Path) -> Vec<Box<dyn Analyzer>> {
    vec![
        Box::new(RuffAnalyzer::new()),
        Box::new(EslintAnalyzer::for_repo(repo)),
    ]
}

/// Run every analyzer whose languages appear in `detected`.
pub fn run_analyzers(
    repo: &Path,
    analyzers: &[Box<dyn Analyzer>],
    detected: &BTreeMap<Language, usize>,
) -> Result<AnalysisOutput> {
    let mut output = AnalysisOutput::default();

    for analyzer in analyzers {
        let relevant = analyzer
            .languages()
            .iter()
            .any(|language| detected.get(language).is_some_and(|n| *n > 0));
        if !relevant {
            continue;
        }

        if !analyzer.is_available() {
            let message = format!("{} is not installed", analyzer.name());
            if analyzer.is_required() {
                return Err(Error::analyzer(analyzer.name(), message));
            }
            let languages: Vec<_> = analyzer.languages().iter().map(|l| l.to_string()).collect();
            let warning = format!("{message}; skipping {}", languages.join("/"));
            warn!("{warning}");
            output.warnings.push(warning);
            continue;
        }

        let issues = analyzer.analyze(repo)?;
        info!(analyzer = analyzer.name(), issues = issues.len(), "analysis complete");
        output.analyzers_run.push(analyzer.name());
        output.issues.extend(issues);
    }

    Ok(output)
}
