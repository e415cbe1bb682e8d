//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Job source error: {0}")]
    Source(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("AI generation failed: {0}")]
    Ai(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Browser automation failed: {0}")]
    Automation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Submitted applications never change again.
    #[error("Application {id} is already submitted and cannot change")]
    ApplicationImmutable { id: i64 },

    #[error("UI error: {0}")]
    Ui(String),
}
