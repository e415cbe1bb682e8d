//! End-to-end run over the real store, renderer and mock model: scrape, keywords, auto-apply.

use jobfinder::adapters::ai::MockLlmAdapter;
use jobfinder::adapters::documents::{LopdfRenderer, PdfTextReader};
use jobfinder::adapters::persistence::{SearchSettingsFile, SqliteRepo};
use jobfinder::domain::{
    ApplicationStatus, DomainError, FormProfile, Gender, JobPosting, Language, NewProfile,
    Platform, Preferences, SearchPage, SearchQuery, SubmissionOutcome, SubmissionRequest,
    UploadSection,
};
use jobfinder::ports::{
    ApplicationRepo, FormSubmitter, JobRepo, JobSource, LetterRepo, ProfileRepo, SettingsPort,
};
use jobfinder::usecases::{
    ApplyService, CoverLetterService, DocumentService, ScrapeService, SearchTermGenerator,
};
use std::sync::{Arc, Mutex};

struct OnePageSource;

#[async_trait::async_trait]
impl JobSource for OnePageSource {
    fn platform(&self) -> Platform {
        Platform::JobUp
    }

    async fn fetch_page(&self, _query: &SearchQuery, page: u32) -> Result<SearchPage, DomainError> {
        let mut quick = JobPosting::new(
            Platform::JobUp,
            "1001",
            "We are looking for a backend engineer to build our payment services in Rust.",
            "https://www.jobup.ch/en/jobs/detail/1001/",
        );
        quick.title = Some("Backend Engineer".into());
        quick.company = Some("Acme AG".into());
        quick.quick_apply = true;
        let mut manual = JobPosting::new(
            Platform::JobUp,
            "1002",
            "We are hiring a senior Java developer for our banking platform.",
            "https://www.jobup.ch/en/jobs/detail/1002/",
        );
        manual.title = Some("Java Developer".into());
        Ok(SearchPage {
            postings: if page == 1 { vec![quick, manual] } else { Vec::new() },
            total_pages: 1,
        })
    }
}

#[derive(Default)]
struct RecordingSubmitter {
    requests: Mutex<Vec<SubmissionRequest>>,
}

#[async_trait::async_trait]
impl FormSubmitter for RecordingSubmitter {
    fn platform(&self) -> Platform {
        Platform::JobUp
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionOutcome, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(SubmissionOutcome::Submitted)
    }
}

#[tokio::test]
async fn scrape_then_auto_apply_records_a_submitted_application() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(SqliteRepo::connect(dir.path()).await.unwrap());
    let settings = Arc::new(SearchSettingsFile::new(dir.path().join("search.json")));
    let llm = Arc::new(MockLlmAdapter::with_delay(0));

    let user = repo
        .create_profile(&NewProfile {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            username: "grace".into(),
            contact_info: Some(
                "Grace Hopper\nBahnhofstrasse 1\n8001 Zürich\ngrace@example.com".into(),
            ),
            cv_text: Some("Compiler engineer with a long record in systems programming.".into()),
            reference_letter: None,
            preferences: Preferences {
                exclusions: vec!["java".into()],
                ..Preferences::default()
            },
        })
        .await
        .unwrap();
    repo.save_form_profile(
        user.id,
        Platform::JobUp,
        &FormProfile {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            phone: "0790000000".into(),
            zip_code: "8001".into(),
            gender: Gender::Female,
            availability: 0,
            work_permit: 1,
            auto_answer_requirements: true,
        },
    )
    .await
    .unwrap();

    let terms = SearchTermGenerator::new(llm.clone(), repo.clone(), settings.clone());
    let keywords = terms.refresh_keywords(user.id, Language::En).await.unwrap();
    assert_eq!(keywords.len(), 5);
    assert_eq!(settings.load().await.unwrap().keywords, keywords);

    let scrape = ScrapeService::new(Arc::new(OnePageSource), repo.clone());
    let stats = scrape
        .scrape(
            &SearchQuery::default().with_term(keywords[0].clone()),
            &user.preferences.exclusions,
        )
        .await
        .unwrap();
    assert_eq!(stats.new_postings, 1);
    assert_eq!(stats.excluded, 1);

    let letters = Arc::new(CoverLetterService::new(
        llm.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
    ));
    let documents = Arc::new(DocumentService::new(
        Arc::new(LopdfRenderer::new()),
        Arc::new(PdfTextReader::new()),
        repo.clone(),
        repo.clone(),
        repo.clone(),
        dir.path().join("exports"),
    ));
    let submitter = Arc::new(RecordingSubmitter::default());
    let apply = ApplyService::new(
        repo.clone(),
        repo.clone(),
        repo.clone(),
        letters,
        documents,
        submitter.clone(),
        false,
    );

    let report = apply.auto_apply(user.id, Some(5)).await.unwrap();
    assert_eq!(report.submitted, 1);

    let apps = repo.list_applications(user.id).await.unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].status, ApplicationStatus::Submitted);
    let pdf_path = apps[0].pdf_path.clone().unwrap();
    assert_eq!(
        pdf_path.file_name().unwrap().to_string_lossy(),
        "Cover_Letter_Hopper_Acme_AG.pdf"
    );
    let pdf = std::fs::read(&pdf_path).unwrap();
    assert_eq!(lopdf::Document::load_mem(&pdf).unwrap().get_pages().len(), 1);

    let stored = repo.get_letter(user.id, apps[0].job_id).await.unwrap().unwrap();
    assert_eq!(stored.recipient_info.as_deref(), Some("To whom it may concern"));
    assert_eq!(stored.pdf.as_deref(), Some(pdf.as_slice()));

    let requests = submitter.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].direct_apply);
    assert_eq!(requests[0].files[0].section, UploadSection::Motivation);
    assert_eq!(requests[0].files[0].name, "Letter_Acme_AG.pdf");

    // a second run finds nothing new to apply to
    drop(requests);
    let again = apply.auto_apply(user.id, None).await.unwrap();
    assert_eq!(again.submitted, 0);
    assert_eq!(again.skipped, 1);
    assert_eq!(repo.list_postings().await.unwrap().len(), 1);
}
