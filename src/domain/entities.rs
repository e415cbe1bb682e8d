//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP, browser or SQL types here. Adapters map into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Job board a posting was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    JobUp,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JobUp => "jobup",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "jobup" => Some(Self::JobUp),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized job posting as yielded by a job source. Unique per (platform, external_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub platform: Platform,
    pub external_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: String,
    pub url: String,
    pub discovered_at: DateTime<Utc>,
    pub posted_date: Option<String>,
    pub work_location: Option<String>,
    pub contract_type: Option<String>,
    pub activity_rate: Option<String>,
    pub company_info: Option<String>,
    pub company_contact: Option<String>,
    pub company_url: Option<String>,
    pub categories: Vec<String>,
    pub quick_apply: bool,
}

impl JobPosting {
    /// Minimal posting; optional attributes start empty.
    pub fn new(
        platform: Platform,
        external_id: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            external_id: external_id.into(),
            title: None,
            company: None,
            description: description.into(),
            url: url.into(),
            discovered_at: Utc::now(),
            posted_date: None,
            work_location: None,
            contract_type: None,
            activity_rate: None,
            company_info: None,
            company_contact: None,
            company_url: None,
            categories: Vec::new(),
            quick_apply: false,
        }
    }

    /// External id, description and URL must be non-empty.
    pub fn validate(&self) -> Result<(), super::DomainError> {
        for (field, value) in [
            ("external_id", &self.external_id),
            ("description", &self.description),
            ("url", &self.url),
        ] {
            if value.trim().is_empty() {
                return Err(super::DomainError::Validation(format!(
                    "posting field `{}` is required",
                    field
                )));
            }
        }
        Ok(())
    }

    /// Display label used in logs: "title @ company".
    pub fn label(&self) -> String {
        format!(
            "{} @ {}",
            self.title.as_deref().unwrap_or("untitled"),
            self.company.as_deref().unwrap_or("unknown company")
        )
    }

    fn context_fields(&self) -> [(&'static str, &str); 5] {
        [
            ("Company name", self.company.as_deref().unwrap_or("")),
            ("Company information", self.company_info.as_deref().unwrap_or("")),
            ("Job title", self.title.as_deref().unwrap_or("")),
            ("Job description", self.description.as_str()),
            ("Job location", self.work_location.as_deref().unwrap_or("")),
        ]
    }

    /// Text block handed to the language model.
    pub fn context_block(&self) -> String {
        self.context_fields()
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Language of the job context. Detection runs on the field values so the English
    /// labels of `context_block` do not count.
    pub fn language(&self) -> super::Language {
        let text = self
            .context_fields()
            .iter()
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        super::Language::detect(&text)
    }

    /// True when any exclusion term appears in title, company or description (case-insensitive).
    pub fn matches_any(&self, terms: &[String]) -> bool {
        let haystack = format!(
            "{} {} {}",
            self.title.as_deref().unwrap_or(""),
            self.company.as_deref().unwrap_or(""),
            self.description
        )
        .to_lowercase();
        terms
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .any(|t| haystack.contains(&t))
    }
}

/// A stored posting with its row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: i64,
    pub posting: JobPosting,
}

/// Preference set of a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// Free-form career goals handed to the search term generator.
    #[serde(default)]
    pub notes: Option<String>,
}

/// User profile. `contact_info` is the letter sender block: name on line 1, then address lines
/// including "<zip> <city>".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub contact_info: Option<String>,
    pub cv_text: Option<String>,
    pub cv_document_id: Option<i64>,
    pub reference_letter: Option<String>,
    pub preferences: Preferences,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Sender block; falls back to name and email when no contact block is stored.
    pub fn sender_block(&self) -> String {
        match self.contact_info.as_deref().map(str::trim) {
            Some(block) if !block.is_empty() => block.to_string(),
            _ => format!("{}\n{}", self.full_name(), self.email),
        }
    }
}

/// Fields required to create a profile; the store assigns the id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub contact_info: Option<String>,
    pub cv_text: Option<String>,
    pub reference_letter: Option<String>,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Cv,
    Photo,
    Other,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cv => "cv",
            Self::Photo => "photo",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cv" => Some(Self::Cv),
            "photo" => Some(Self::Photo),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Stored user file (CV, photo, certificates...).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: DocumentKind,
    pub content: Vec<u8>,
}

/// Formatted recipient lines of a letter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipientInfo {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub address: Vec<String>,
}

/// Letter sections as drafted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterDraft {
    pub subject: String,
    pub greeting: String,
    pub introduction: String,
    pub skills_experience: String,
    pub motivation: String,
    pub conclusion: String,
    pub closing: String,
}

impl CoverLetterDraft {
    fn sections(&self) -> [&str; 7] {
        [
            &self.subject,
            &self.greeting,
            &self.introduction,
            &self.skills_experience,
            &self.motivation,
            &self.conclusion,
            &self.closing,
        ]
    }

    /// Character count over all sections.
    pub fn total_len(&self) -> usize {
        self.sections().iter().map(|s| s.chars().count()).sum()
    }

    /// Letter body: greeting through closing, separated by blank lines.
    pub fn body(&self) -> String {
        self.sections()[1..]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Stored cover letter. One per (user, posting).
#[derive(Debug, Clone, PartialEq)]
pub struct CoverLetter {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub draft: CoverLetterDraft,
    pub recipient_info: Option<String>,
    pub pdf: Option<Vec<u8>>,
}

impl CoverLetter {
    /// Plain text of the letter: subject followed by the body.
    pub fn text(&self) -> String {
        format!("{}\n\n{}", self.draft.subject.trim(), self.draft.body())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Stored answers for a site's application form. One per (user, site).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub zip_code: String,
    pub gender: Gender,
    /// 0..=6; mapped onto the site's availability menu.
    pub availability: u8,
    /// 1..=10; position in the site's work permit menu.
    pub work_permit: u8,
    #[serde(default = "default_true")]
    pub auto_answer_requirements: bool,
}

fn default_true() -> bool {
    true
}

impl FormProfile {
    pub fn validate(&self) -> Result<(), super::DomainError> {
        if self.availability > 6 {
            return Err(super::DomainError::Validation(format!(
                "availability {} out of range (0-6)",
                self.availability
            )));
        }
        if !(1..=10).contains(&self.work_permit) {
            return Err(super::DomainError::Validation(format!(
                "work permit {} out of range (1-10)",
                self.work_permit
            )));
        }
        Ok(())
    }
}

/// Scraping filters. Values are the jobup query parameter ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub employment_grade_min: Option<u8>,
    #[serde(default)]
    pub employment_grade_max: Option<u8>,
    /// Publication window in days (1, 3, 7, 14 or 31).
    #[serde(default)]
    pub publication_date: Option<u8>,
    #[serde(default)]
    pub categories: Vec<u32>,
    #[serde(default)]
    pub benefit: Option<u32>,
    #[serde(default)]
    pub regions: Vec<u32>,
}

impl SearchQuery {
    pub fn with_term(&self, term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..self.clone()
        }
    }
}

/// Scraping filters plus the scheduler's keyword list, kept in `search.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub filters: SearchQuery,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub postings: Vec<JobPosting>,
    /// Total pages advertised by the source; at least 1.
    pub total_pages: u32,
}

/// File handed to the application form.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub section: UploadSection,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Document section of an application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadSection {
    Cv,
    Motivation,
    Other,
}

impl UploadSection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cv => "cv",
            Self::Motivation => "motivation",
            Self::Other => "other",
        }
    }
}

/// Everything the automator needs to submit one application.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub platform: Platform,
    pub external_id: String,
    pub form: FormProfile,
    pub files: Vec<UploadFile>,
    /// true = click "apply"; false = only save the draft on the site.
    pub direct_apply: bool,
}

/// Result of driving the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Submitted,
    AlreadyApplied,
    Expired,
    Incomplete {
        missing_fields: Vec<String>,
        missing_files: Vec<String>,
    },
}

/// Paths produced by the document builder.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltDocuments {
    pub letter_pdf: PathBuf,
    pub cv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> JobPosting {
        let mut p = JobPosting::new(Platform::JobUp, "abc", "Build Rust services", "https://x/abc");
        p.title = Some("Backend Engineer".into());
        p.company = Some("Acme SA".into());
        p
    }

    #[test]
    fn validate_requires_description() {
        let mut p = posting();
        p.description = "  ".into();
        assert!(p.validate().is_err());
        assert!(posting().validate().is_ok());
    }

    #[test]
    fn language_follows_the_whole_job_context() {
        let mut p = JobPosting::new(Platform::JobUp, "fr1", "Rust developer", "https://x/fr1");
        p.title = Some("Software Engineer".into());
        p.company_info = Some(
            "Notre entreprise familiale est située au bord du lac et emploie plus de deux cents \
             collaborateurs passionnés par la qualité de leurs produits et le service à la clientèle."
                .into(),
        );
        p.work_location = Some("Lausanne".into());
        assert_eq!(p.language(), crate::domain::Language::Fr);
        assert!(p.context_block().starts_with("Company name: \nCompany information: Notre"));
    }

    #[test]
    fn exclusions_match_case_insensitively() {
        let p = posting();
        assert!(p.matches_any(&["acme".to_string()]));
        assert!(!p.matches_any(&["java".to_string(), "  ".to_string()]));
    }

    #[test]
    fn draft_body_skips_subject_and_empty_sections() {
        let draft = CoverLetterDraft {
            subject: "Application".into(),
            greeting: "Dear Sir or Madam,".into(),
            introduction: "Intro".into(),
            skills_experience: "".into(),
            motivation: "Motivation".into(),
            conclusion: "Conclusion".into(),
            closing: "Yours sincerely".into(),
        };
        assert_eq!(
            draft.body(),
            "Dear Sir or Madam,\n\nIntro\n\nMotivation\n\nConclusion\n\nYours sincerely"
        );
        assert_eq!(draft.total_len(), draft.sections().iter().map(|s| s.len()).sum::<usize>());
    }

    #[test]
    fn form_profile_ranges() {
        let mut form = FormProfile {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "0790000000".into(),
            zip_code: "1000".into(),
            gender: Gender::Female,
            availability: 7,
            work_permit: 1,
            auto_answer_requirements: true,
        };
        assert!(form.validate().is_err());
        form.availability = 0;
        assert!(form.validate().is_ok());
        form.work_permit = 11;
        assert!(form.validate().is_err());
    }

    #[test]
    fn sender_block_falls_back_to_name_and_email() {
        let profile = UserProfile {
            id: 1,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            contact_info: None,
            cv_text: None,
            cv_document_id: None,
            reference_letter: None,
            preferences: Preferences::default(),
        };
        assert_eq!(profile.sender_block(), "Ada Lovelace\nada@example.com");
    }
}
