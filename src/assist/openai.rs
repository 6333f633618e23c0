//! OpenAI-compatible chat completion endpoints (Groq, Together, OpenRouter).

use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

use super::prompt::{
    build_prompt, build_review_prompt, clean_response, clean_review, REVIEW_SYSTEM_PROMPT, SYSTEM_PROMPT,
};
use super::{
    map_transport_error, status_error, AssistError, AssistRequest, FixAssistant, ReviewRequest, MAX_TOKENS,
    REVIEW_MAX_TOKENS,
};
use crate::config::ProviderKind;

pub struct OpenAiCompatibleAssistant {
    client: Client,
    kind: ProviderKind,
    endpoint: &'static str,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleAssistant {
    pub fn new(
        kind: ProviderKind,
        api_key: String,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AssistError> {
        let (endpoint, default_model) = match kind {
            ProviderKind::Groq => (
                "https://api.groq.com/openai/v1/chat/completions",
                "llama-3.3-70b-versatile",
            ),
            ProviderKind::Together => (
                "https://api.together.xyz/v1/chat/completions",
                "meta-llama/Llama-3-70b-chat-hf",
            ),
            ProviderKind::OpenRouter => (
                "https://openrouter.ai/api/v1/chat/completions",
                "meta-llama/llama-3-70b-instruct",
            ),
            ProviderKind::Anthropic => {
                return Err(AssistError::Setup(
                    "anthropic does not speak the OpenAI wire format".to_string(),
                ))
            }
        };
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssistError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            kind,
            endpoint,
            api_key,
            model: model.unwrap_or_else(|| default_model.to_string()),
        })
    }
}

impl OpenAiCompatibleAssistant {
    fn complete(&self, system: &str, prompt: String, max_tokens: u32) -> Result<String, AssistError> {
        let start = Instant::now();
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": max_tokens,
            "temperature": 0.2,
        });

        debug!("{} request: model={}", self.kind, self.model);

        let mut builder = self
            .client
            .post(self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body);
        if self.kind == ProviderKind::OpenRouter {
            builder = builder.header("X-Title", "lintpilot");
        }
        let response = builder.send().map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(status_error(status, error_text));
        }

        let raw: Value = response.json().map_err(map_transport_error)?;
        debug!(
            provider = %self.kind,
            latency_ms = start.elapsed().as_millis() as u64,
            "completion received"
        );

        raw["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AssistError::Malformed(format!("no content in {} response", self.kind)))
    }
}

impl FixAssistant for OpenAiCompatibleAssistant {
    fn provider(&self) -> &str {
        self.kind.as_str()
    }

    fn suggest(&self, request: &AssistRequest) -> Result<String, AssistError> {
        let content = self.complete(SYSTEM_PROMPT, build_prompt(request), MAX_TOKENS)?;
        clean_response(&content)
    }

    fn review(&self, request: &ReviewRequest) -> Result<String, AssistError> {
        let content = self.complete(REVIEW_SYSTEM_PROMPT, build_review_prompt(request), REVIEW_MAX_TOKENS)?;
        clean_review(&content)
    }
}
