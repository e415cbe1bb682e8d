//! OpenAI-compatible chat completions adapter.
//!
//! Works with OpenAI, Groq, Ollama and any endpoint speaking the same protocol.
//! Requests a JSON object response and strips markdown fences before parsing.
//! Retries on transport errors, 429 and 5xx with exponential backoff.

use crate::domain::DomainError;
use crate::ports::LlmPort;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings of one provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Label used in logs, e.g. "openai" or "groq".
    pub name: String,
    /// Full chat completions URL.
    pub api_url: String,
    /// May be empty for local Ollama.
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

pub struct OpenAiAdapter {
    client: reqwest::Client,
    settings: ProviderSettings,
    max_retries: u32,
    retry_base: Duration,
}

impl OpenAiAdapter {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base: DEFAULT_RETRY_BASE,
        }
    }

    /// Override the retry policy (attempts >= 1).
    pub fn with_retry(mut self, max_retries: u32, retry_base: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_base = retry_base;
        self
    }

    /// Sanitize JSON response from the model.
    ///
    /// Models sometimes wrap JSON in markdown code blocks or add a lead-in sentence.
    fn sanitize_json(raw_text: &str) -> String {
        let trimmed = raw_text.trim();

        if trimmed.starts_with("```") {
            let without_prefix = trimmed
                .strip_prefix("```json")
                .or_else(|| trimmed.strip_prefix("```"))
                .unwrap_or(trimmed);
            if let Some(end_idx) = without_prefix.rfind("```") {
                return without_prefix[..end_idx].trim().to_string();
            }
            return without_prefix.trim().to_string();
        }

        if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
            if start < end {
                return trimmed[start..=end].to_string();
            }
        }

        trimmed.to_string()
    }

    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<String, Attempt> {
        let mut builder = self
            .client
            .post(&self.settings.api_url)
            .timeout(REQUEST_TIMEOUT)
            .header("Content-Type", "application/json")
            .json(request);
        if !self.settings.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.settings.api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Attempt::Retry(DomainError::Ai(format!("HTTP request failed: {}", e))))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(provider = %self.settings.name, status = %status, body = %text, "LLM API returned error");
            let err = DomainError::Ai(format!(
                "{} API error {}: {}",
                self.settings.name,
                status,
                text.chars().take(200).collect::<String>()
            ));
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                Attempt::Retry(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            Attempt::Fatal(DomainError::Ai(format!("Failed to parse API response: {}", e)))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Attempt::Fatal(DomainError::Ai("No response choices returned".into())))
    }
}

/// Outcome of a failed attempt.
enum Attempt {
    Retry(DomainError),
    Fatal(DomainError),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

#[async_trait::async_trait]
impl LlmPort for OpenAiAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, DomainError> {
        info!(
            provider = %self.settings.name,
            model = %self.settings.model,
            prompt_len = user.len(),
            "sending prompt to LLM"
        );

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let mut last_error = None;
        let mut raw_content = None;
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // 1x, 2x, 4x the base delay
                let delay = self.retry_base * (1 << (attempt - 1));
                warn!(
                    provider = %self.settings.name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "LLM call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            match self.send_once(&request).await {
                Ok(content) => {
                    raw_content = Some(content);
                    break;
                }
                Err(Attempt::Retry(e)) => last_error = Some(e),
                Err(Attempt::Fatal(e)) => return Err(e),
            }
        }

        let raw_content = match raw_content {
            Some(c) => c,
            None => {
                return Err(last_error.unwrap_or_else(|| {
                    DomainError::Ai(format!("{}: no attempt made", self.settings.name))
                }));
            }
        };
        debug!(raw_len = raw_content.len(), "received LLM response");

        let clean_json = Self::sanitize_json(&raw_content);
        let value: serde_json::Value = serde_json::from_str(&clean_json).map_err(|e| {
            warn!(error = %e, json = %clean_json.chars().take(200).collect::<String>(), "JSON parse failed");
            DomainError::Ai(format!("Failed to parse LLM JSON: {}", e))
        })?;
        if !value.is_object() {
            return Err(DomainError::Ai("LLM answer is not a JSON object".into()));
        }
        Ok(value)
    }
}
