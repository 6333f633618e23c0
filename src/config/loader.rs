use std::fs;
use std::path::{Path, PathBuf};

use super::core::LintpilotConfig;
use super::validation::validate_config;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".lintpilot.toml";

/// Parse and validate config from a TOML string.
pub fn parse_and_validate_config(contents: &str) -> std::result::Result<LintpilotConfig, String> {
    let config = toml::from_str::<LintpilotConfig>(contents)
        .map_err(|e| format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))?;

    validate_config(&config).map_err(|errors| errors.join("; "))?;

    Ok(config)
}

/// Locate the config file: an explicit path must exist, otherwise the
/// repository root is searched.
pub(crate) fn find_config_file(repo_path: &Path, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::configuration_at(
                format!("config file not found: {}", path.display()),
                path,
            ));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let candidate = repo_path.join(CONFIG_FILE_NAME);
    Ok(candidate.is_file().then_some(candidate))
}

/// Load the configuration for a repository.
///
/// A missing default file yields the defaults; anything unreadable, malformed
/// or invalid is a configuration error.
pub fn load_config(repo_path: &Path, explicit: Option<&Path>) -> Result<LintpilotConfig> {
    let Some(config_path) = find_config_file(repo_path, explicit)? else {
        tracing::debug!("No {} found in {}, using defaults", CONFIG_FILE_NAME, repo_path.display());
        return Ok(LintpilotConfig::default());
    };

    let contents = fs::read_to_string(&config_path).map_err(|e| {
        Error::configuration_at(format!("failed to read config file: {e}"), &config_path)
    })?;

    let config = parse_and_validate_config(&contents)
        .map_err(|message| Error::configuration_at(message, &config_path))?;

    tracing::info!("Loaded config from {}", config_path.display());
    Ok(config)
}
