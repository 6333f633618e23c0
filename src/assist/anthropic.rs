//! Anthropic Messages API.

use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::prompt::{
    build_prompt, build_review_prompt, clean_response, clean_review, REVIEW_SYSTEM_PROMPT, SYSTEM_PROMPT,
};
use super::{
    map_transport_error, status_error, AssistError, AssistRequest, FixAssistant, ReviewRequest, MAX_TOKENS,
    REVIEW_MAX_TOKENS,
};

const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

pub struct AnthropicAssistant {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicAssistant {
    pub fn new(api_key: String, model: Option<String>, timeout: Duration) -> Result<Self, AssistError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssistError::Setup(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// Concatenate the text blocks of a Messages API response.
fn response_text(raw: &Value) -> Option<String> {
    let blocks = raw["content"].as_array()?;
    let text: String = blocks
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect();
    (!blocks.is_empty()).then_some(text)
}

impl AnthropicAssistant {
    fn complete(&self, system: &str, prompt: String, max_tokens: u32) -> Result<String, AssistError> {
        let body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "system": system,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!("Anthropic request: model={}", self.model);

        let response = self
            .client
            .post(ENDPOINT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(status_error(status, error_text));
        }

        let raw: Value = response.json().map_err(map_transport_error)?;
        response_text(&raw)
            .ok_or_else(|| AssistError::Malformed("no content in Anthropic response".to_string()))
    }
}

impl FixAssistant for AnthropicAssistant {
    fn provider(&self) -> &str {
        "anthropic"
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
