//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    Application, CoverLetter, CoverLetterDraft, Document, DocumentKind, DomainError, FormProfile,
    JobPosting, JobRecord, LetterLayout, NewApplication, NewProfile, Platform, SearchPage,
    SearchQuery, SearchSettings, SubmissionOutcome, SubmissionRequest, UserProfile,
};
use std::path::Path;

/// Job board search. One implementation per platform.
#[async_trait::async_trait]
pub trait JobSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetch and parse one result page (1-based).
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<SearchPage, DomainError>;
}

/// Posting store. (platform, external_id) is unique.
#[async_trait::async_trait]
pub trait JobRepo: Send + Sync {
    /// Insert the posting, or return the stored one untouched. The flag is true on insert.
    async fn upsert_posting(&self, posting: &JobPosting) -> Result<(JobRecord, bool), DomainError>;

    async fn get_posting(&self, id: i64) -> Result<Option<JobRecord>, DomainError>;

    async fn find_posting(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> Result<Option<JobRecord>, DomainError>;

    /// Newest first.
    async fn list_postings(&self) -> Result<Vec<JobRecord>, DomainError>;

    async fn list_quick_apply(&self) -> Result<Vec<JobRecord>, DomainError>;

    /// Removes the posting together with its cover letters.
    async fn delete_posting(&self, id: i64) -> Result<(), DomainError>;
}

/// Profiles, their documents and their per-site form answers.
#[async_trait::async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn create_profile(&self, profile: &NewProfile) -> Result<UserProfile, DomainError>;

    async fn get_profile(&self, id: i64) -> Result<Option<UserProfile>, DomainError>;

    async fn update_profile(&self, profile: &UserProfile) -> Result<(), DomainError>;

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, DomainError>;

    async fn save_document(
        &self,
        user_id: i64,
        name: &str,
        kind: DocumentKind,
        content: &[u8],
    ) -> Result<Document, DomainError>;

    async fn get_document(&self, id: i64) -> Result<Option<Document>, DomainError>;

    async fn documents_by_kind(
        &self,
        user_id: i64,
        kind: DocumentKind,
    ) -> Result<Vec<Document>, DomainError>;

    /// Replaces any earlier answers for the same (user, site).
    async fn save_form_profile(
        &self,
        user_id: i64,
        platform: Platform,
        form: &FormProfile,
    ) -> Result<(), DomainError>;

    async fn get_form_profile(
        &self,
        user_id: i64,
        platform: Platform,
    ) -> Result<Option<FormProfile>, DomainError>;
}

/// Cover letters. One per (user, posting); saving again replaces the draft and drops the PDF.
#[async_trait::async_trait]
pub trait LetterRepo: Send + Sync {
    async fn save_letter(
        &self,
        user_id: i64,
        job_id: i64,
        draft: &CoverLetterDraft,
        recipient_info: Option<&str>,
    ) -> Result<CoverLetter, DomainError>;

    async fn get_letter(&self, user_id: i64, job_id: i64)
    -> Result<Option<CoverLetter>, DomainError>;

    async fn attach_pdf(&self, letter_id: i64, pdf: &[u8]) -> Result<(), DomainError>;
}

/// Application records. (user, posting) is unique; submitted rows are never rewritten.
#[async_trait::async_trait]
pub trait ApplicationRepo: Send + Sync {
    async fn record_application(&self, app: &NewApplication) -> Result<Application, DomainError>;

    async fn find_application(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> Result<Option<Application>, DomainError>;

    async fn get_application(&self, id: i64) -> Result<Option<Application>, DomainError>;

    async fn list_applications(&self, user_id: i64) -> Result<Vec<Application>, DomainError>;

    /// Persists status and letter fields. Fails with `ApplicationImmutable` when the stored row is submitted.
    async fn update_application(&self, app: &Application) -> Result<(), DomainError>;
}

/// Chat-completion model answering with a JSON object.
#[async_trait::async_trait]
pub trait LlmPort: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, DomainError>;
}

/// Rendered PDF and its page count.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// Letter layout to PDF. CPU bound; callers run it on a blocking thread.
pub trait PdfRenderer: Send + Sync {
    fn render(&self, layout: &LetterLayout, font_size: f32) -> Result<RenderedPdf, DomainError>;
}

/// Text extraction from CV PDFs.
pub trait CvReader: Send + Sync {
    fn extract_text(&self, pdf: &[u8]) -> Result<String, DomainError>;
}

/// Drives a platform's application form.
#[async_trait::async_trait]
pub trait FormSubmitter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionOutcome, DomainError>;
}

/// Search settings file (filters and keyword list).
#[async_trait::async_trait]
pub trait SettingsPort: Send + Sync {
    /// Missing file yields defaults.
    async fn load(&self) -> Result<SearchSettings, DomainError>;

    async fn save(&self, settings: &SearchSettings) -> Result<(), DomainError>;

    async fn export_to(&self, path: &Path) -> Result<(), DomainError>;

    /// Reads and validates `path`, then replaces the stored settings.
    async fn import_from(&self, path: &Path) -> Result<SearchSettings, DomainError>;
}
