//! Application use cases. Orchestrate domain logic via ports.

pub mod apply_service;
pub mod cover_letter_service;
pub mod document_service;
pub mod prompts;
pub mod scheduler_service;
pub mod scrape_service;
pub mod search_terms;

#[cfg(test)]
pub mod test_support;

pub use apply_service::{ApplyService, AutoApplyReport};
pub use cover_letter_service::CoverLetterService;
pub use document_service::{BatchReport, DocumentService};
pub use scheduler_service::{KeywordScheduler, Rotation};
pub use scrape_service::{ScrapeService, ScrapeStats, search_postings};
pub use search_terms::SearchTermGenerator;
