//! LLM adapters. Implement LlmPort.
//!
//! OpenAI-compatible HTTP client, provider fallback chain and a mock for running offline.

pub mod fallback;
pub mod mock_adapter;
pub mod openai_adapter;

pub use fallback::FallbackLlm;
pub use mock_adapter::MockLlmAdapter;
pub use openai_adapter::{OpenAiAdapter, ProviderSettings};
