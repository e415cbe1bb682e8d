//! Document building: stored letter -> one-page PDF in the exports directory, plus CV import.

use crate::domain::letter::{
    date_line, default_recipient, letter_pdf_filename, sanitize_filename, sender_city,
};
use crate::domain::{
    BuiltDocuments, CoverLetter, DocumentKind, DomainError, JobRecord, Language, LetterLayout,
    UserProfile,
};
use crate::ports::{CvReader, JobRepo, LetterRepo, PdfRenderer, ProfileRepo, RenderedPdf};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Tried in order; the first size producing exactly one page wins.
pub const FONT_SIZES: [f32; 3] = [12.0, 11.0, 10.0];

/// Maximum concurrent renders in a batch.
const MAX_CONCURRENT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

pub struct DocumentService {
    renderer: Arc<dyn PdfRenderer>,
    cv_reader: Arc<dyn CvReader>,
    jobs: Arc<dyn JobRepo>,
    profiles: Arc<dyn ProfileRepo>,
    letters: Arc<dyn LetterRepo>,
    exports_dir: PathBuf,
}

/// Renders on a blocking thread, shrinking the font until the letter fits one page.
pub async fn fit_one_page(
    renderer: Arc<dyn PdfRenderer>,
    layout: LetterLayout,
) -> Result<RenderedPdf, DomainError> {
    tokio::task::spawn_blocking(move || {
        for size in FONT_SIZES {
            let pdf = renderer.render(&layout, size)?;
            if pdf.pages == 1 {
                return Ok(pdf);
            }
            info!(font_size = size, pages = pdf.pages, "letter too long, shrinking font");
        }
        Err(DomainError::Document(
            "cover letter does not fit on one page even at the smallest font size".into(),
        ))
    })
    .await
    .map_err(|e| DomainError::Document(format!("render task failed: {}", e)))?
}

fn letter_layout(profile: &UserProfile, job: &JobRecord, letter: &CoverLetter) -> LetterLayout {
    let language = Language::detect(&letter.draft.body());
    let sender = profile.sender_block();
    let signature = sender
        .lines()
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .unwrap_or_else(|| profile.full_name());
    let recipient = letter
        .recipient_info
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| default_recipient(language).recipient);
    let filename = letter_pdf_filename(&profile.last_name, job.posting.company.as_deref());

    LetterLayout {
        title: filename.trim_end_matches(".pdf").to_string(),
        date_line: date_line(
            language,
            sender_city(&sender).as_deref(),
            Local::now().date_naive(),
        ),
        sender,
        recipient,
        subject: letter.draft.subject.trim().to_string(),
        body: letter.draft.body(),
        signature,
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), DomainError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| DomainError::Document(format!("write {}: {}", path.display(), e)))
}

impl DocumentService {
    pub fn new(
        renderer: Arc<dyn PdfRenderer>,
        cv_reader: Arc<dyn CvReader>,
        jobs: Arc<dyn JobRepo>,
        profiles: Arc<dyn ProfileRepo>,
        letters: Arc<dyn LetterRepo>,
        exports_dir: PathBuf,
    ) -> Self {
        Self {
            renderer,
            cv_reader,
            jobs,
            profiles,
            letters,
            exports_dir,
        }
    }

    pub async fn has_letter(&self, user_id: i64, job_id: i64) -> Result<bool, DomainError> {
        Ok(self.letters.get_letter(user_id, job_id).await?.is_some())
    }

    async fn profile(&self, user_id: i64) -> Result<UserProfile, DomainError> {
        self.profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("profile {}", user_id)))
    }

    /// Renders the stored letter of (user, posting), attaches the PDF to it and writes it to the
    /// exports directory together with the user's CV.
    pub async fn build_letter_pdf(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> Result<BuiltDocuments, DomainError> {
        let profile = self.profile(user_id).await?;
        let job = self
            .jobs
            .get_posting(job_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("posting {}", job_id)))?;
        let letter = self.letters.get_letter(user_id, job_id).await?.ok_or_else(|| {
            DomainError::NotFound(format!("cover letter for user {} and posting {}", user_id, job_id))
        })?;

        let layout = letter_layout(&profile, &job, &letter);
        let filename = format!("{}.pdf", layout.title);
        let pdf = fit_one_page(Arc::clone(&self.renderer), layout).await?;
        self.letters.attach_pdf(letter.id, &pdf.bytes).await?;

        tokio::fs::create_dir_all(&self.exports_dir)
            .await
            .map_err(|e| DomainError::Document(format!("create exports dir: {}", e)))?;
        let letter_pdf = self.exports_dir.join(&filename);
        write_file(&letter_pdf, &pdf.bytes).await?;

        let cv = self.export_cv(&profile).await?;
        info!(path = %letter_pdf.display(), cv = cv.is_some(), "letter PDF written");
        Ok(BuiltDocuments { letter_pdf, cv })
    }

    /// Writes the profile's CV document next to the letters. None without a stored CV.
    async fn export_cv(&self, profile: &UserProfile) -> Result<Option<PathBuf>, DomainError> {
        let doc = match profile.cv_document_id {
            Some(id) => self.profiles.get_document(id).await?,
            None => self
                .profiles
                .documents_by_kind(profile.id, DocumentKind::Cv)
                .await?
                .into_iter()
                .next(),
        };
        let Some(doc) = doc else {
            return Ok(None);
        };
        let mut name = sanitize_filename(&doc.name);
        if !name.to_lowercase().ends_with(".pdf") {
            name.push_str(".pdf");
        }
        let path = self.exports_dir.join(name);
        write_file(&path, &doc.content).await?;
        Ok(Some(path))
    }

    /// Builds PDFs for many postings, at most `MAX_CONCURRENT` at a time.
    pub async fn build_batch(self: &Arc<Self>, user_id: i64, job_ids: &[i64]) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT));
        let mut handles = Vec::with_capacity(job_ids.len());

        for &job_id in job_ids {
            let sem = Arc::clone(&semaphore);
            let service = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| DomainError::Document(format!("render limiter closed: {}", e)))?;
                service.build_letter_pdf(user_id, job_id).await
            }));
        }

        let mut report = BatchReport {
            total: job_ids.len(),
            ..BatchReport::default()
        };
        for (handle, job_id) in handles.into_iter().zip(job_ids) {
            match handle.await {
                Ok(Ok(_)) => report.successful += 1,
                Ok(Err(e)) => {
                    warn!(job_id, error = %e, "letter PDF failed");
                    report.failed += 1;
                }
                Err(e) => {
                    error!(job_id, error = %e, "letter PDF task panicked");
                    report.failed += 1;
                }
            }
        }
        info!(
            successful = report.successful,
            failed = report.failed,
            total = report.total,
            "batch build finished"
        );
        report
    }

    /// Stores the CV PDF as the profile's CV document and its text as `cv_text`.
    pub async fn import_cv(
        &self,
        user_id: i64,
        name: &str,
        pdf: Vec<u8>,
    ) -> Result<UserProfile, DomainError> {
        let mut profile = self.profile(user_id).await?;
        let reader = Arc::clone(&self.cv_reader);
        let (text, pdf) = tokio::task::spawn_blocking(move || {
            reader.extract_text(&pdf).map(|text| (text, pdf))
        })
        .await
        .map_err(|e| DomainError::Document(format!("extraction task failed: {}", e)))??;

        let doc = self
            .profiles
            .save_document(user_id, name, DocumentKind::Cv, &pdf)
            .await?;
        profile.cv_text = Some(text);
        profile.cv_document_id = Some(doc.id);
        self.profiles.update_profile(&profile).await?;
        info!(user_id, document_id = doc.id, "CV imported");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CoverLetterDraft;
    use crate::usecases::test_support::{FakeCvReader, FakeRenderer, InMemory, posting, profile};

    fn draft(body_len: usize) -> CoverLetterDraft {
        CoverLetterDraft {
            subject: "Candidature".into(),
            greeting: "Madame,".into(),
            introduction: "é".repeat(body_len),
            skills_experience: String::new(),
            motivation: String::new(),
            conclusion: String::new(),
            closing: "Salutations".into(),
        }
    }

    async fn setup(dir: &Path) -> (Arc<InMemory>, Arc<DocumentService>, i64, i64) {
        let store = InMemory::new();
        let user = store.add_profile(profile()).await;
        let job = store.add_posting(posting("abc", true)).await;
        let service = Arc::new(DocumentService::new(
            Arc::new(FakeRenderer),
            Arc::new(FakeCvReader),
            store.clone(),
            store.clone(),
            store.clone(),
            dir.join("exports"),
        ));
        (store, service, user.id, job.id)
    }

    #[tokio::test]
    async fn fitting_shrinks_font_until_one_page() {
        let mut layout = LetterLayout {
            title: "t".into(),
            sender: String::new(),
            recipient: String::new(),
            date_line: String::new(),
            subject: String::new(),
            body: "a".repeat(1150),
            signature: String::new(),
        };
        // 1150 chars: two pages at 12pt and 11pt, one at 10pt
        let pdf = fit_one_page(Arc::new(FakeRenderer), layout.clone()).await.unwrap();
        assert_eq!(String::from_utf8(pdf.bytes).unwrap(), "%PDF t 10");

        layout.body = "a".repeat(1300);
        assert!(matches!(
            fit_one_page(Arc::new(FakeRenderer), layout).await,
            Err(DomainError::Document(_))
        ));
    }

    #[tokio::test]
    async fn builds_pdf_attaches_it_and_exports_cv() {
        let dir = tempfile::tempdir().unwrap();
        let (store, service, user, job) = setup(dir.path()).await;
        store.save_letter(user, job, &draft(100), Some("Acme SA")).await.unwrap();
        service
            .import_cv(user, "Ada CV", b"Rust, Tokio, SQLite".to_vec())
            .await
            .unwrap();

        let built = service.build_letter_pdf(user, job).await.unwrap();
        assert_eq!(
            built.letter_pdf,
            dir.path().join("exports").join("Cover_Letter_Lovelace_Acme_SA.pdf")
        );
        assert!(built.letter_pdf.exists());
        assert_eq!(built.cv, Some(dir.path().join("exports").join("Ada_CV.pdf")));
        assert!(store.letters.lock().unwrap()[0].pdf.is_some());

        let profile = store.profiles.lock().unwrap()[0].clone();
        assert_eq!(profile.cv_text.as_deref(), Some("Rust, Tokio, SQLite"));
        assert!(profile.cv_document_id.is_some());
    }

    #[tokio::test]
    async fn missing_letter_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (_, service, user, job) = setup(dir.path()).await;
        assert!(matches!(
            service.build_letter_pdf(user, job).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn batch_counts_successes_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let (store, service, user, job) = setup(dir.path()).await;
        let long_job = store.add_posting(posting("long", true)).await.id;
        store.save_letter(user, job, &draft(100), None).await.unwrap();
        store.save_letter(user, long_job, &draft(5000), None).await.unwrap();

        let report = service.build_batch(user, &[job, long_job, 999]).await;
        assert_eq!(
            report,
            BatchReport {
                successful: 1,
                failed: 2,
                total: 3
            }
        );
    }
}
