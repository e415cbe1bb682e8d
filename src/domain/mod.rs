//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod application;
pub mod entities;
pub mod errors;
pub mod language;
pub mod letter;

pub use application::{Application, ApplicationStatus, NewApplication};
pub use entities::{
    BuiltDocuments, CoverLetter, CoverLetterDraft, Document, DocumentKind, FormProfile, Gender,
    JobPosting, JobRecord, NewProfile, Platform, Preferences, RecipientInfo, SearchPage,
    SearchQuery, SearchSettings, SubmissionOutcome, SubmissionRequest, UploadFile, UploadSection,
    UserProfile,
};
pub use errors::DomainError;
pub use language::Language;
pub use letter::LetterLayout;
