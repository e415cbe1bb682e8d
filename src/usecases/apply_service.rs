//! Applying: letter -> PDF -> form submission -> application record.
//!
//! Auto-apply walks the quick-apply postings; manual review goes through `approve` and
//! `submit_approved`. A submitted application is never rewritten.

use crate::domain::letter::upload_letter_name;
use crate::domain::{
    Application, ApplicationStatus, BuiltDocuments, DomainError, FormProfile, JobRecord,
    NewApplication, SubmissionOutcome, SubmissionRequest, UploadFile, UploadSection, UserProfile,
};
use crate::ports::{ApplicationRepo, FormSubmitter, JobRepo, ProfileRepo};
use crate::usecases::{CoverLetterService, DocumentService};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome counts of one auto-apply run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoApplyReport {
    pub submitted: usize,
    pub already_applied: usize,
    pub expired: usize,
    pub incomplete: usize,
    pub failed: usize,
    /// Postings that already had an application.
    pub skipped: usize,
}

pub struct ApplyService {
    jobs: Arc<dyn JobRepo>,
    profiles: Arc<dyn ProfileRepo>,
    applications: Arc<dyn ApplicationRepo>,
    cover_letters: Arc<CoverLetterService>,
    documents: Arc<DocumentService>,
    submitter: Arc<dyn FormSubmitter>,
    direct_apply: bool,
}

/// Letter text and built files for one posting.
struct Prepared {
    letter_text: String,
    built: BuiltDocuments,
}

async fn read_upload(
    path: &Path,
    section: UploadSection,
    name: String,
) -> Result<UploadFile, DomainError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DomainError::Document(format!("read {}: {}", path.display(), e)))?;
    Ok(UploadFile {
        section,
        name,
        bytes,
    })
}

impl ApplyService {
    pub fn new(
        jobs: Arc<dyn JobRepo>,
        profiles: Arc<dyn ProfileRepo>,
        applications: Arc<dyn ApplicationRepo>,
        cover_letters: Arc<CoverLetterService>,
        documents: Arc<DocumentService>,
        submitter: Arc<dyn FormSubmitter>,
        direct_apply: bool,
    ) -> Self {
        Self {
            jobs,
            profiles,
            applications,
            cover_letters,
            documents,
            submitter,
            direct_apply,
        }
    }

    async fn profile(&self, user_id: i64) -> Result<UserProfile, DomainError> {
        self.profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("profile {}", user_id)))
    }

    async fn form(&self, user_id: i64) -> Result<FormProfile, DomainError> {
        let platform = self.submitter.platform();
        let form = self
            .profiles
            .get_form_profile(user_id, platform)
            .await?
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "profile {} has no form answers for {}",
                    user_id,
                    platform.as_str()
                ))
            })?;
        form.validate()?;
        Ok(form)
    }

    async fn posting(&self, job_id: i64) -> Result<JobRecord, DomainError> {
        self.jobs
            .get_posting(job_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("posting {}", job_id)))
    }

    /// Drafts a fresh letter and builds its PDF.
    async fn prepare(&self, user_id: i64, job_id: i64) -> Result<Prepared, DomainError> {
        let letter = self.cover_letters.generate(user_id, job_id).await?;
        let built = self.documents.build_letter_pdf(user_id, job_id).await?;
        Ok(Prepared {
            letter_text: letter.text(),
            built,
        })
    }

    async fn request(
        &self,
        profile: &UserProfile,
        form: &FormProfile,
        job: &JobRecord,
        built: &BuiltDocuments,
    ) -> Result<SubmissionRequest, DomainError> {
        let letter_name = upload_letter_name(
            job.posting.language(),
            job.posting.company.as_deref(),
            &profile.first_name,
            &profile.last_name,
        );
        let mut files = vec![read_upload(&built.letter_pdf, UploadSection::Motivation, letter_name).await?];
        if let Some(cv) = &built.cv {
            let name = cv
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "CV.pdf".to_string());
            files.push(read_upload(cv, UploadSection::Cv, name).await?);
        }
        Ok(SubmissionRequest {
            platform: job.posting.platform,
            external_id: job.posting.external_id.clone(),
            form: form.clone(),
            files,
            direct_apply: self.direct_apply,
        })
    }

    /// Expired postings are removed together with their letters.
    async fn forget_expired(&self, job: &JobRecord) -> Result<(), DomainError> {
        info!(job = %job.posting.label(), "posting expired, removing it");
        self.jobs.delete_posting(job.id).await
    }

    async fn apply_one(
        &self,
        profile: &UserProfile,
        form: &FormProfile,
        job: &JobRecord,
    ) -> Result<SubmissionOutcome, DomainError> {
        let prepared = self.prepare(profile.id, job.id).await?;
        let request = self.request(profile, form, job, &prepared.built).await?;
        let outcome = self.submitter.submit(&request).await?;
        match &outcome {
            SubmissionOutcome::Submitted | SubmissionOutcome::AlreadyApplied => {
                self.applications
                    .record_application(&NewApplication {
                        user_id: profile.id,
                        job_id: job.id,
                        cover_letter: prepared.letter_text,
                        pdf_path: Some(prepared.built.letter_pdf),
                        status: ApplicationStatus::Submitted,
                    })
                    .await?;
            }
            SubmissionOutcome::Expired => self.forget_expired(job).await?,
            SubmissionOutcome::Incomplete { .. } => {}
        }
        Ok(outcome)
    }

    /// Applies to every quick-apply posting without an application, stopping after `max`
    /// submissions. Per-posting failures are logged and counted.
    pub async fn auto_apply(
        &self,
        user_id: i64,
        max: Option<usize>,
    ) -> Result<AutoApplyReport, DomainError> {
        let platform = self.submitter.platform();
        let mut report = AutoApplyReport::default();
        let mut pending = Vec::new();
        for job in self.jobs.list_quick_apply().await? {
            if job.posting.platform != platform {
                continue;
            }
            if self
                .applications
                .find_application(user_id, job.id)
                .await?
                .is_some()
            {
                report.skipped += 1;
                continue;
            }
            pending.push(job);
        }
        if pending.is_empty() {
            info!(user_id, skipped = report.skipped, "no quick-apply postings to apply to");
            return Ok(report);
        }

        let profile = self.profile(user_id).await?;
        let form = self.form(user_id).await?;
        info!(user_id, candidates = pending.len(), "auto-apply started");

        for job in pending {
            if max.is_some_and(|max| report.submitted >= max) {
                info!(max = ?max, "application limit reached");
                break;
            }
            match self.apply_one(&profile, &form, &job).await {
                Ok(SubmissionOutcome::Submitted) => {
                    info!(job = %job.posting.label(), "application submitted");
                    report.submitted += 1;
                }
                Ok(SubmissionOutcome::AlreadyApplied) => report.already_applied += 1,
                Ok(SubmissionOutcome::Expired) => report.expired += 1,
                Ok(SubmissionOutcome::Incomplete {
                    missing_fields,
                    missing_files,
                }) => {
                    warn!(
                        job = %job.posting.label(),
                        ?missing_fields,
                        ?missing_files,
                        "form left incomplete"
                    );
                    report.incomplete += 1;
                }
                Err(e) => {
                    warn!(job = %job.posting.label(), error = %e, "application failed");
                    report.failed += 1;
                }
            }
        }
        info!(?report, "auto-apply finished");
        Ok(report)
    }

    /// Prepares letter and PDF for review and records an approved application. An earlier
    /// approval is refreshed; a submitted application is left untouched.
    pub async fn approve(&self, user_id: i64, job_id: i64) -> Result<Application, DomainError> {
        let existing = self.applications.find_application(user_id, job_id).await?;
        if let Some(app) = &existing {
            app.ensure_mutable()?;
        }
        let prepared = self.prepare(user_id, job_id).await?;

        match existing {
            Some(mut app) => {
                app.cover_letter = prepared.letter_text;
                app.pdf_path = Some(prepared.built.letter_pdf);
                self.applications.update_application(&app).await?;
                Ok(app)
            }
            None => {
                self.applications
                    .record_application(&NewApplication {
                        user_id,
                        job_id,
                        cover_letter: prepared.letter_text,
                        pdf_path: Some(prepared.built.letter_pdf),
                        status: ApplicationStatus::Approved,
                    })
                    .await
            }
        }
    }

    /// Submits an approved application with its stored letter.
    pub async fn submit_approved(&self, app_id: i64) -> Result<SubmissionOutcome, DomainError> {
        let mut app = self
            .applications
            .get_application(app_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("application {}", app_id)))?;
        app.ensure_mutable()?;

        let profile = self.profile(app.user_id).await?;
        let form = self.form(app.user_id).await?;
        let job = self.posting(app.job_id).await?;
        let built = self.documents.build_letter_pdf(app.user_id, app.job_id).await?;
        let request = self.request(&profile, &form, &job, &built).await?;

        let outcome = self.submitter.submit(&request).await?;
        match &outcome {
            SubmissionOutcome::Submitted | SubmissionOutcome::AlreadyApplied => {
                app.transition(ApplicationStatus::Submitted)?;
                app.pdf_path = Some(built.letter_pdf);
                self.applications.update_application(&app).await?;
                info!(application_id = app.id, "approved application submitted");
            }
            SubmissionOutcome::Expired => self.forget_expired(&job).await?,
            SubmissionOutcome::Incomplete { .. } => {
                warn!(application_id = app.id, "form left incomplete, application stays approved");
            }
        }
        Ok(outcome)
    }
}
