//! Typed configuration loaded from `.lintpilot.toml`.

mod core;
mod loader;
pub mod validation;

pub use self::core::{
    AiConfig, FixConfig, LintpilotConfig, PathsConfig, ProviderKind, RuleOverride, RulesConfig,
    SkipMatcher, StateConfig, UsageConfig,
};
pub use loader::{load_config, parse_and_validate_config, CONFIG_FILE_NAME};
pub use validation::validate_config;
