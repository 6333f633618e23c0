use crate::config::CONFIG_FILE_NAME;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const EXAMPLE_CONFIG: &str = r#"# Lintpilot Configuration

[rules]
# Only fix these codes (empty means every SAFE rule)
enabled = []
disabled = []
# Never remove imports from __init__.py files
skip_init_files = true

# Move a rule between categories:
# [[rules.overrides]]
# code = "E501"
# language = "python"
# category = "suggest"
# confidence = 0.1

[fix]
max_issues_per_run = 1000
# Reject a fix that removes more than this share of a file
max_shrink_ratio = 0.5

[ai]
enabled = false
# groq | together | openrouter | anthropic (default: first with an API key)
# provider = "groq"
timeout_secs = 30
context_lines = 5
# Files with findings that need a human sent for an AI review (0 = off)
review_files = 3

[usage]
# AI calls allowed per provider within the window
limit = 10
window_seconds = 3600

[paths]
skip = [
    "__pycache__",
    ".git",
    ".venv",
    "venv",
    ".tox",
    "node_modules",
    "dist",
    "build",
    "*.min.js"
]
"#;

pub fn init_config(force: bool) -> Result<()> {
    write_example_config(Path::new("."), force)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");
    Ok(())
}

pub fn write_example_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, EXAMPLE_CONFIG)
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_and_validate_config, LintpilotConfig};
    use tempfile::TempDir;

    #[test]
    fn example_config_parses_to_defaults() {
        let parsed = parse_and_validate_config(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, LintpilotConfig::default());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        write_example_config(dir.path(), false).unwrap();
        assert!(write_example_config(dir.path(), false).is_err());
        write_example_config(dir.path(), true).unwrap();
    }
}
