//! The LLM collaborator: one prompt in, one plain-text answer out.

use std::future::Future;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::config::{LlmConfig, RequestStyle};

/// LLM request failures.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure or timeout.
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("LLM endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response envelope has no recognisable text.
    #[error("malformed LLM response: {0}")]
    Malformed(String),
}

/// A text-completion backend.
pub trait LlmClient {
    /// Sends `prompt` and returns the answer as plain text.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// [`LlmClient`] over an HTTP JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpLlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    fn request_body(&self, prompt: &str) -> Value {
        match self.config.style {
            RequestStyle::Chat => json!({
                "model": self.config.model,
                "messages": [
                    { "role": "user", "content": prompt }
                ],
                "stream": false
            }),
            RequestStyle::Completion | RequestStyle::Generate => json!({
                "model": self.config.model,
                "prompt": prompt,
                "stream": false
            }),
        }
    }
}

impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut request = self
            .client
            .post(&self.config.endpoint)
            .json(&self.request_body(prompt));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = normalize_response(&body)?;
        debug!(
            prompt_chars = prompt.len(),
            response_chars = text.len(),
            "LLM exchange"
        );
        Ok(text)
    }
}

/// Reduces a response body to plain text.
///
/// Accepts an OpenAI chat envelope (`choices[0].message.content`), a
/// completion envelope (`choices[0].text`), an Ollama chat or generate
/// envelope (`message.content`, `response`), a bare JSON string, or a body
/// that is not JSON at all.
///
/// # Errors
///
/// Returns [`LlmError::Malformed`] for JSON without any of those fields.
pub fn normalize_response(body: &str) -> Result<String, LlmError> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Ok(body.trim().to_string());
    };

    let text = value
        .pointer("/choices/0/message/content")
        .or_else(|| value.pointer("/choices/0/text"))
        .or_else(|| value.pointer("/message/content"))
        .or_else(|| value.get("response"))
        .or(Some(&value))
        .and_then(Value::as_str);

    text.map(|t| t.trim().to_string()).ok_or_else(|| {
        let mut preview: String = body.chars().take(120).collect();
        if preview.len() < body.len() {
            preview.push_str("...");
        }
        LlmError::Malformed(preview)
    })
}
