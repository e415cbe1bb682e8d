//! Provider fallback: tries each configured LLM in order.

use crate::domain::DomainError;
use crate::ports::LlmPort;
use std::sync::Arc;
use tracing::warn;

/// Ordered provider list. The first success wins; the last error is surfaced.
pub struct FallbackLlm {
    providers: Vec<Arc<dyn LlmPort>>,
}

impl FallbackLlm {
    pub fn new(providers: Vec<Arc<dyn LlmPort>>) -> Self {
        Self { providers }
    }
}

#[async_trait::async_trait]
impl LlmPort for FallbackLlm {
    fn name(&self) -> &str {
        self.providers.first().map(|p| p.name()).unwrap_or("none")
    }

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, DomainError> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.complete_json(system, user).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "LLM provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| DomainError::Config("no LLM provider configured".into())))
    }
}
