//! AI-provider collaborator.
//!
//! For a SAFE issue without a mechanical fixer, an assistant receives the
//! issue plus surrounding lines and answers with replacement text for the
//! issue's line. For files whose findings need a human, it returns free-form
//! review suggestions (see [`review`]). Every failure is an [`AssistError`];
//! callers turn those into deferrals or report entries.

mod anthropic;
mod openai;
pub mod prompt;
pub mod review;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub use anthropic::AnthropicAssistant;
pub use openai::OpenAiCompatibleAssistant;

use crate::config::{AiConfig, ProviderKind};
use crate::core::{Issue, Language};

pub(crate) const MAX_TOKENS: u32 = 512;
pub(crate) const REVIEW_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone)]
pub struct AssistRequest {
    pub issue: Issue,
    pub rule_name: String,
    /// Numbered lines around the issue.
    pub snippet: String,
    /// Current text of the issue's line.
    pub target_line: String,
}

/// One file sent for review, with the findings left for a human.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub file_path: PathBuf,
    pub language: Language,
    /// File content, possibly truncated.
    pub code: String,
    /// `line N CODE: message` per finding.
    pub findings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("request timed out")]
    Timeout,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("assistant declined to fix this line")]
    Refused,

    #[error("assistant could not be set up: {0}")]
    Setup(String),
}

pub trait FixAssistant: Send + Sync {
    fn provider(&self) -> &str;

    fn suggest(&self, request: &AssistRequest) -> Result<String, AssistError>;

    fn review(&self, request: &ReviewRequest) -> Result<String, AssistError>;
}

pub(crate) fn map_transport_error(error: reqwest::Error) -> AssistError {
    if error.is_timeout() {
        AssistError::Timeout
    } else if error.is_decode() {
        AssistError::Malformed(error.to_string())
    } else {
        AssistError::Transport(error.to_string())
    }
}

pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> AssistError {
    match status.as_u16() {
        401 | 403 => AssistError::Auth(format!("HTTP {status}")),
        code => AssistError::Http {
            status: code,
            body: body.chars().take(200).collect(),
        },
    }
}

/// Pick the provider and its API key. An explicit provider must have its
/// key set; otherwise the first provider in priority order with a key wins.
pub fn resolve_provider<F>(config: &AiConfig, lookup: F) -> Option<(ProviderKind, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let key_for = |kind: ProviderKind| {
        lookup(kind.api_key_var())
            .filter(|key| !key.trim().is_empty())
            .map(|key| (kind, key))
    };
    match config.provider {
        Some(kind) => key_for(kind),
        None => ProviderKind::PRIORITY.into_iter().find_map(key_for),
    }
}

/// Build the configured assistant, or `None` when AI is disabled or no API
/// key is available.
pub fn from_config(config: &AiConfig) -> Option<Box<dyn FixAssistant>> {
    if !config.enabled {
        return None;
    }
    let Some((kind, api_key)) = resolve_provider(config, |var| std::env::var(var).ok()) else {
        warn!("AI assistance enabled but no provider API key is set");
        return None;
    };

    let timeout = Duration::from_secs(config.timeout_secs);
    let model = config.model.clone();
    let built: Result<Box<dyn FixAssistant>, AssistError> = match kind {
        ProviderKind::Anthropic => {
            AnthropicAssistant::new(api_key, model, timeout).map(|a| Box::new(a) as Box<dyn FixAssistant>)
        }
        _ => OpenAiCompatibleAssistant::new(kind, api_key, model, timeout)
            .map(|a| Box::new(a) as Box<dyn FixAssistant>),
    };

    match built {
        Ok(assistant) => {
            debug!(provider = %kind, "AI assistant ready");
            Some(assistant)
        }
        Err(e) => {
            warn!("AI assistant unavailable: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn auto_detect_follows_priority() {
        let config = AiConfig::default();
        let found = resolve_provider(
            &config,
            env(&[("ANTHROPIC_API_KEY", "a"), ("TOGETHER_API_KEY", "t")]),
        );
        assert_eq!(found, Some((ProviderKind::Together, "t".to_string())));
        assert_eq!(resolve_provider(&config, env(&[("GROQ_API_KEY", " ")])), None);
    }

    #[test]
    fn explicit_provider_needs_its_own_key() {
        let config = AiConfig {
            provider: Some(ProviderKind::Anthropic),
            ..AiConfig::default()
        };
        assert_eq!(resolve_provider(&config, env(&[("GROQ_API_KEY", "g")])), None);
        assert!(resolve_provider(&config, env(&[("ANTHROPIC_API_KEY", "k")])).is_some());
    }

    #[test]
    fn disabled_config_builds_nothing() {
        assert!(from_config(&AiConfig::default()).is_none());
    }

    #[test]
    fn auth_statuses_are_distinguished() {
        assert!(matches!(
            status_error(reqwest::StatusCode::UNAUTHORIZED, String::new()),
            AssistError::Auth(_)
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            AssistError::Http { status: 429, .. }
        ));
    }
}
