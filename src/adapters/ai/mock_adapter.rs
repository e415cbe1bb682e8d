//! Mock LLM adapter for running without an API key.
//!
//! Returns canned answers shaped after the requested JSON schema. No network calls.

use crate::domain::DomainError;
use crate::ports::LlmPort;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Simulates network latency with a configurable delay.
pub struct MockLlmAdapter {
    delay_ms: u64,
}

impl MockLlmAdapter {
    /// Default delay 100ms.
    pub fn new() -> Self {
        Self { delay_ms: 100 }
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }
}

impl Default for MockLlmAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmPort for MockLlmAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, DomainError> {
        info!(prompt_len = user.len(), "[MOCK] Simulating LLM call");
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        let prompt = format!("{}\n{}", system, user);
        if prompt.contains("\"keywords\"") {
            return Ok(json!({
                "keywords": [
                    "Software Engineer",
                    "Backend Developer",
                    "Rust Developer",
                    "Systems Engineer",
                    "DevOps Engineer"
                ]
            }));
        }
        if prompt.contains("\"recipient\"") {
            return Ok(json!({
                "company_name": null,
                "recipient": "To whom it may concern",
                "address": []
            }));
        }
        Ok(json!({
            "subject": "[MOCK] Application",
            "greeting": "Dear Sir or Madam,",
            "introduction": "[MOCK] I am writing to apply for the advertised position.",
            "skills_experience": "[MOCK] My experience matches the requirements of the role.",
            "motivation": "[MOCK] Your company's work motivates me to contribute.",
            "conclusion": "[MOCK] I would welcome the opportunity to discuss my application.",
            "closing": "Yours sincerely"
        }))
    }
}
