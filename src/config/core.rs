use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{Category, Language};

/// Root configuration structure, read from `.lintpilot.toml`.
///
/// Every table rejects unknown keys so a misspelled option fails the run
/// before any file is touched instead of being silently ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LintpilotConfig {
    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub fix: FixConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub usage: UsageConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub state: StateConfig,
}

/// Which rule codes may be fixed, and classifier table overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Restrict fixing to these codes. Empty means every SAFE code.
    #[serde(default)]
    pub enabled: Vec<String>,

    #[serde(default)]
    pub disabled: Vec<String>,

    /// Never remove imports from `__init__.py` files.
    #[serde(default = "default_skip_init_files")]
    pub skip_init_files: bool,

    #[serde(default)]
    pub overrides: Vec<RuleOverride>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            disabled: Vec::new(),
            skip_init_files: default_skip_init_files(),
            overrides: Vec::new(),
        }
    }
}

impl RulesConfig {
    pub fn allows(&self, rule_code: &str) -> bool {
        if self.disabled.iter().any(|c| c == rule_code) {
            return false;
        }
        self.enabled.is_empty() || self.enabled.iter().any(|c| c == rule_code)
    }
}

fn default_skip_init_files() -> bool {
    true
}

/// Replaces or extends one entry of the classifier tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleOverride {
    pub code: String,

    /// Restrict the override to one language; omitted means every language.
    #[serde(default)]
    pub language: Option<Language>,

    pub category: Category,

    /// Ignored for SAFE entries, which are always fully trusted.
    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FixConfig {
    #[serde(default = "default_max_issues_per_run")]
    pub max_issues_per_run: usize,

    /// Largest fraction of a file one fix pass may delete.
    #[serde(default = "default_max_shrink_ratio")]
    pub max_shrink_ratio: f64,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            max_issues_per_run: default_max_issues_per_run(),
            max_shrink_ratio: default_max_shrink_ratio(),
        }
    }
}

fn default_max_issues_per_run() -> usize {
    1000
}

fn default_max_shrink_ratio() -> f64 {
    0.5
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    Together,
    OpenRouter,
    Anthropic,
}

impl ProviderKind {
    /// Auto-detection order when no provider is configured.
    pub const PRIORITY: [ProviderKind; 4] = [
        ProviderKind::Groq,
        ProviderKind::Together,
        ProviderKind::OpenRouter,
        ProviderKind::Anthropic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::Together => "together",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::Together => "TOGETHER_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub provider: Option<ProviderKind>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Lines of surrounding code sent with each request.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    /// Files with RISKY or SUGGEST findings sent for a review per run.
    /// Zero turns the review off.
    #[serde(default = "default_review_files")]
    pub review_files: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: None,
            model: None,
            timeout_secs: default_timeout_secs(),
            context_lines: default_context_lines(),
            review_files: default_review_files(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_context_lines() -> usize {
    5
}

fn default_review_files() -> usize {
    3
}

/// Sliding-window limit on AI-provider calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UsageConfig {
    #[serde(default = "default_usage_limit")]
    pub limit: usize,

    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            limit: default_usage_limit(),
            window_seconds: default_window_seconds(),
        }
    }
}

fn default_usage_limit() -> usize {
    10
}

fn default_window_seconds() -> u64 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Glob patterns matched against each path component and the relative path.
    #[serde(default = "default_skip_patterns")]
    pub skip: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            skip: default_skip_patterns(),
        }
    }
}

fn default_skip_patterns() -> Vec<String> {
    [
        "__pycache__",
        ".git",
        ".venv",
        "venv",
        ".tox",
        "node_modules",
        "dist",
        "build",
        "*.min.js",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Compiled form of [`PathsConfig::skip`].
#[derive(Debug, Clone, Default)]
pub struct SkipMatcher {
    patterns: Vec<glob::Pattern>,
}

impl SkipMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, glob::PatternError> {
        let patterns = patterns
            .iter()
            .map(|p| glob::Pattern::new(p.trim_end_matches('/')))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// `relative` is the path below the repository root.
    pub fn is_skipped(&self, relative: &Path) -> bool {
        self.patterns.iter().any(|pattern| {
            pattern.matches_path(relative)
                || relative
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .any(|component| pattern.matches(component))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    /// Directory holding the usage store and run log.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl StateConfig {
    /// Command-line override first, then the config file, then `~/.lintpilot`.
    pub fn resolve_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.dir.clone())
            .or_else(|| dirs::home_dir().map(|home| home.join(".lintpilot")))
            .unwrap_or_else(|| PathBuf::from(".lintpilot"))
    }
}
