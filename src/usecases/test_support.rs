//! In-memory port implementations for use case tests.

use crate::domain::{
    Application, CoverLetter, CoverLetterDraft, Document, DocumentKind, DomainError, FormProfile,
    Gender, JobPosting, JobRecord, LetterLayout, NewApplication, NewProfile, Platform,
    Preferences, SearchPage, SearchQuery, SearchSettings, SubmissionOutcome, SubmissionRequest,
    UserProfile,
};
use crate::ports::{
    ApplicationRepo, CvReader, FormSubmitter, JobRepo, JobSource, LetterRepo, LlmPort,
    PdfRenderer, ProfileRepo, RenderedPdf, SettingsPort,
};
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct InMemory {
    pub postings: Mutex<Vec<JobRecord>>,
    pub profiles: Mutex<Vec<UserProfile>>,
    pub documents: Mutex<Vec<Document>>,
    pub forms: Mutex<HashMap<(i64, Platform), FormProfile>>,
    pub letters: Mutex<Vec<CoverLetter>>,
    pub applications: Mutex<Vec<Application>>,
    pub settings: Mutex<SearchSettings>,
}

impl InMemory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn add_profile(&self, profile: NewProfile) -> UserProfile {
        self.create_profile(&profile).await.unwrap()
    }

    pub async fn add_posting(&self, posting: JobPosting) -> JobRecord {
        self.upsert_posting(&posting).await.unwrap().0
    }
}

pub fn profile() -> NewProfile {
    NewProfile {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        username: "ada".into(),
        contact_info: Some("Ada Lovelace\nRue du Lac 4\n1009 Pully\nada@example.com".into()),
        cv_text: Some("Rust engineer, 8 years of distributed systems.".into()),
        reference_letter: None,
        preferences: Preferences::default(),
    }
}

pub fn form() -> FormProfile {
    FormProfile {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        phone: "0790000000".into(),
        zip_code: "1009".into(),
        gender: Gender::Female,
        availability: 0,
        work_permit: 1,
        auto_answer_requirements: true,
    }
}

pub fn posting(external_id: &str, quick_apply: bool) -> JobPosting {
    let mut p = JobPosting::new(
        Platform::JobUp,
        external_id,
        "Nous recherchons un ingénieur logiciel pour développer nos services en Rust à Lausanne.",
        format!("https://www.jobup.ch/fr/emplois/detail/{}/", external_id),
    );
    p.title = Some("Ingénieur logiciel".into());
    p.company = Some("Acme SA".into());
    p.quick_apply = quick_apply;
    p
}

pub fn draft_json() -> serde_json::Value {
    serde_json::json!({
        "subject": "Candidature: Ingénieur logiciel",
        "greeting": "Madame, Monsieur,",
        "introduction": "Votre annonce a retenu toute mon attention.",
        "skills_experience": "Huit ans de systèmes distribués en Rust.",
        "motivation": "Acme SA construit exactement ce que j'aime construire.",
        "conclusion": "Je me réjouis de vous rencontrer.",
        "closing": "Meilleures salutations"
    })
}

fn not_found(what: &str, id: i64) -> DomainError {
    DomainError::NotFound(format!("{} {}", what, id))
}

#[async_trait::async_trait]
impl JobRepo for InMemory {
    async fn upsert_posting(&self, posting: &JobPosting) -> Result<(JobRecord, bool), DomainError> {
        let mut postings = self.postings.lock().unwrap();
        if let Some(existing) = postings.iter().find(|r| {
            r.posting.platform == posting.platform && r.posting.external_id == posting.external_id
        }) {
            return Ok((existing.clone(), false));
        }
        let record = JobRecord {
            id: postings.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            posting: posting.clone(),
        };
        postings.push(record.clone());
        Ok((record, true))
    }

    async fn get_posting(&self, id: i64) -> Result<Option<JobRecord>, DomainError> {
        Ok(self.postings.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn find_posting(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> Result<Option<JobRecord>, DomainError> {
        Ok(self
            .postings
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.posting.platform == platform && r.posting.external_id == external_id)
            .cloned())
    }

    async fn list_postings(&self) -> Result<Vec<JobRecord>, DomainError> {
        let mut all = self.postings.lock().unwrap().clone();
        all.reverse();
        Ok(all)
    }

    async fn list_quick_apply(&self) -> Result<Vec<JobRecord>, DomainError> {
        Ok(self
            .list_postings()
            .await?
            .into_iter()
            .filter(|r| r.posting.quick_apply)
            .collect())
    }

    async fn delete_posting(&self, id: i64) -> Result<(), DomainError> {
        self.postings.lock().unwrap().retain(|r| r.id != id);
        self.letters.lock().unwrap().retain(|l| l.job_id != id);
        self.applications
            .lock()
            .unwrap()
            .retain(|a| a.job_id != id || a.is_submitted());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProfileRepo for InMemory {
    async fn create_profile(&self, profile: &NewProfile) -> Result<UserProfile, DomainError> {
        let mut profiles = self.profiles.lock().unwrap();
        let created = UserProfile {
            id: profiles.len() as i64 + 1,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            username: profile.username.clone(),
            contact_info: profile.contact_info.clone(),
            cv_text: profile.cv_text.clone(),
            cv_document_id: None,
            reference_letter: profile.reference_letter.clone(),
            preferences: profile.preferences.clone(),
        };
        profiles.push(created.clone());
        Ok(created)
    }

    async fn get_profile(&self, id: i64) -> Result<Option<UserProfile>, DomainError> {
        Ok(self.profiles.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<(), DomainError> {
        let mut profiles = self.profiles.lock().unwrap();
        let slot = profiles
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or_else(|| not_found("profile", profile.id))?;
        *slot = profile.clone();
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, DomainError> {
        Ok(self.profiles.lock().unwrap().clone())
    }

    async fn save_document(
        &self,
        user_id: i64,
        name: &str,
        kind: DocumentKind,
        content: &[u8],
    ) -> Result<Document, DomainError> {
        let mut documents = self.documents.lock().unwrap();
        let doc = Document {
            id: documents.len() as i64 + 1,
            user_id,
            name: name.to_string(),
            kind,
            content: content.to_vec(),
        };
        documents.push(doc.clone());
        Ok(doc)
    }

    async fn get_document(&self, id: i64) -> Result<Option<Document>, DomainError> {
        Ok(self.documents.lock().unwrap().iter().find(|d| d.id == id).cloned())
    }

    async fn documents_by_kind(
        &self,
        user_id: i64,
        kind: DocumentKind,
    ) -> Result<Vec<Document>, DomainError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id && d.kind == kind)
            .cloned()
            .collect())
    }

    async fn save_form_profile(
        &self,
        user_id: i64,
        platform: Platform,
        form: &FormProfile,
    ) -> Result<(), DomainError> {
        self.forms
            .lock()
            .unwrap()
            .insert((user_id, platform), form.clone());
        Ok(())
    }

    async fn get_form_profile(
        &self,
        user_id: i64,
        platform: Platform,
    ) -> Result<Option<FormProfile>, DomainError> {
        Ok(self.forms.lock().unwrap().get(&(user_id, platform)).cloned())
    }
}

#[async_trait::async_trait]
impl LetterRepo for InMemory {
    async fn save_letter(
        &self,
        user_id: i64,
        job_id: i64,
        draft: &CoverLetterDraft,
        recipient_info: Option<&str>,
    ) -> Result<CoverLetter, DomainError> {
        let mut letters = self.letters.lock().unwrap();
        let id = match letters
            .iter()
            .position(|l| l.user_id == user_id && l.job_id == job_id)
        {
            Some(pos) => letters.remove(pos).id,
            None => letters.iter().map(|l| l.id).max().unwrap_or(0) + 1,
        };
        let letter = CoverLetter {
            id,
            user_id,
            job_id,
            draft: draft.clone(),
            recipient_info: recipient_info.map(str::to_string),
            pdf: None,
        };
        letters.push(letter.clone());
        Ok(letter)
    }

    async fn get_letter(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> Result<Option<CoverLetter>, DomainError> {
        Ok(self
            .letters
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.user_id == user_id && l.job_id == job_id)
            .cloned())
    }

    async fn attach_pdf(&self, letter_id: i64, pdf: &[u8]) -> Result<(), DomainError> {
        let mut letters = self.letters.lock().unwrap();
        let letter = letters
            .iter_mut()
            .find(|l| l.id == letter_id)
            .ok_or_else(|| not_found("cover letter", letter_id))?;
        letter.pdf = Some(pdf.to_vec());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ApplicationRepo for InMemory {
    async fn record_application(&self, app: &NewApplication) -> Result<Application, DomainError> {
        let mut apps = self.applications.lock().unwrap();
        if apps
            .iter()
            .any(|a| a.user_id == app.user_id && a.job_id == app.job_id)
        {
            return Err(DomainError::Validation("duplicate application".into()));
        }
        let stored = Application {
            id: apps.len() as i64 + 1,
            user_id: app.user_id,
            job_id: app.job_id,
            cover_letter: app.cover_letter.clone(),
            pdf_path: app.pdf_path.clone(),
            status: app.status,
            created_at: Utc::now(),
        };
        apps.push(stored.clone());
        Ok(stored)
    }

    async fn find_application(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> Result<Option<Application>, DomainError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user_id == user_id && a.job_id == job_id)
            .cloned())
    }

    async fn get_application(&self, id: i64) -> Result<Option<Application>, DomainError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list_applications(&self, user_id: i64) -> Result<Vec<Application>, DomainError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_application(&self, app: &Application) -> Result<(), DomainError> {
        let mut apps = self.applications.lock().unwrap();
        let slot = apps
            .iter_mut()
            .find(|a| a.id == app.id)
            .ok_or_else(|| not_found("application", app.id))?;
        slot.ensure_mutable()?;
        *slot = app.clone();
        Ok(())
    }
}

#[async_trait::async_trait]
impl SettingsPort for InMemory {
    async fn load(&self) -> Result<SearchSettings, DomainError> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save(&self, settings: &SearchSettings) -> Result<(), DomainError> {
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }

    async fn export_to(&self, _path: &Path) -> Result<(), DomainError> {
        Ok(())
    }

    async fn import_from(&self, _path: &Path) -> Result<SearchSettings, DomainError> {
        self.load().await
    }
}

/// Answers from a script, in order; repeats the last answer when exhausted.
pub struct ScriptedLlm {
    answers: Mutex<Vec<Result<serde_json::Value, DomainError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(answers: Vec<Result<serde_json::Value, DomainError>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

fn clone_result(
    r: &Result<serde_json::Value, DomainError>,
) -> Result<serde_json::Value, DomainError> {
    match r {
        Ok(v) => Ok(v.clone()),
        Err(e) => Err(DomainError::Ai(e.to_string())),
    }
}

#[async_trait::async_trait]
impl LlmPort for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete_json(
        &self,
        _system: &str,
        user: &str,
    ) -> Result<serde_json::Value, DomainError> {
        self.prompts.lock().unwrap().push(user.to_string());
        let mut answers = self.answers.lock().unwrap();
        if answers.len() > 1 {
            answers.remove(0)
        } else {
            answers
                .first()
                .map(clone_result)
                .unwrap_or_else(|| Err(DomainError::Ai("script exhausted".into())))
        }
    }
}

/// Recipient prompts get `recipient`, everything else gets the letter draft.
pub struct LetterLlm {
    pub recipient: serde_json::Value,
    pub draft: serde_json::Value,
}

#[async_trait::async_trait]
impl LlmPort for LetterLlm {
    fn name(&self) -> &str {
        "letter"
    }

    async fn complete_json(
        &self,
        _system: &str,
        user: &str,
    ) -> Result<serde_json::Value, DomainError> {
        if user.contains("\"recipient\"") {
            Ok(self.recipient.clone())
        } else {
            Ok(self.draft.clone())
        }
    }
}

/// Paged source from fixed pages; records every requested (term, page).
pub struct FakeSource {
    pub pages: Vec<Result<Vec<JobPosting>, String>>,
    pub calls: Mutex<Vec<(Option<String>, u32)>>,
}

impl FakeSource {
    pub fn new(pages: Vec<Result<Vec<JobPosting>, String>>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl JobSource for FakeSource {
    fn platform(&self) -> Platform {
        Platform::JobUp
    }

    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<SearchPage, DomainError> {
        self.calls.lock().unwrap().push((query.term.clone(), page));
        match self.pages.get(page as usize - 1) {
            Some(Ok(postings)) => Ok(SearchPage {
                postings: postings.clone(),
                total_pages: self.pages.len() as u32,
            }),
            Some(Err(e)) => Err(DomainError::Source(e.clone())),
            None => Ok(SearchPage {
                postings: Vec::new(),
                total_pages: self.pages.len() as u32,
            }),
        }
    }
}

/// Page count from the body length: one page per 1000 chars at 12pt, shrinking with the font.
pub struct FakeRenderer;

impl PdfRenderer for FakeRenderer {
    fn render(&self, layout: &LetterLayout, font_size: f32) -> Result<RenderedPdf, DomainError> {
        let capacity = (1000.0 * 12.0 / font_size) as usize;
        let pages = layout.body.chars().count().div_ceil(capacity).max(1);
        Ok(RenderedPdf {
            bytes: format!("%PDF {} {}", layout.title, font_size).into_bytes(),
            pages,
        })
    }
}

pub struct FakeCvReader;

impl CvReader for FakeCvReader {
    fn extract_text(&self, pdf: &[u8]) -> Result<String, DomainError> {
        String::from_utf8(pdf.to_vec()).map_err(|e| DomainError::Document(e.to_string()))
    }
}

/// Returns outcomes per external id; `Submitted` for unknown ids.
#[derive(Default)]
pub struct FakeSubmitter {
    pub outcomes: HashMap<String, SubmissionOutcome>,
    pub requests: Mutex<Vec<SubmissionRequest>>,
}

#[async_trait::async_trait]
impl FormSubmitter for FakeSubmitter {
    fn platform(&self) -> Platform {
        Platform::JobUp
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionOutcome, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.external_id == "broken" {
            return Err(DomainError::Automation("browser crashed".into()));
        }
        Ok(self
            .outcomes
            .get(&request.external_id)
            .cloned()
            .unwrap_or(SubmissionOutcome::Submitted))
    }
}
