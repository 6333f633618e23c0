use anyhow::Result;
use std::path::Path;

use crate::classifier::RuleClassifier;
use crate::config::load_config;
use crate::core::Language;
use crate::io::output::{create_writer, OutputFormat};

/// Describe one rule code. Overrides from a `.lintpilot.toml` in the
/// current directory are honored.
pub fn explain_rule(code: &str, language: &str, format: OutputFormat) -> Result<()> {
    let Some(language) = Language::parse(language) else {
        anyhow::bail!("Unknown language '{language}' (expected python, javascript or typescript)");
    };
    let config = load_config(Path::new("."), None)?;
    let classifier = RuleClassifier::with_overrides(&config.rules.overrides);
    create_writer(format).write_rule(&classifier.describe(code, language))?;
    Ok(())
}
