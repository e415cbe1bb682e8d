//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: the terminal menu drives the use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Main loop; returns when the user quits.
    async fn run(&self) -> Result<(), DomainError>;
}
