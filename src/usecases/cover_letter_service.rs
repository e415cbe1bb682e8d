//! Cover letter drafting: posting + profile -> model draft -> stored letter.

use crate::domain::letter::{default_recipient, format_recipient, is_valid_recipient, validate_draft};
use crate::domain::{
    CoverLetter, CoverLetterDraft, DomainError, JobRecord, Language, RecipientInfo, UserProfile,
};
use crate::ports::{JobRepo, LetterRepo, LlmPort, ProfileRepo};
use crate::usecases::prompts;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct CoverLetterService {
    llm: Arc<dyn LlmPort>,
    jobs: Arc<dyn JobRepo>,
    profiles: Arc<dyn ProfileRepo>,
    letters: Arc<dyn LetterRepo>,
}

/// Lenient read of the recipient answer: null and blank values mean absent.
fn parse_recipient(value: &Value) -> RecipientInfo {
    let text = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    RecipientInfo {
        company_name: value.get("company_name").and_then(text),
        recipient: value.get("recipient").and_then(text).unwrap_or_default(),
        address: value
            .get("address")
            .and_then(Value::as_array)
            .map(|lines| lines.iter().filter_map(text).collect())
            .unwrap_or_default(),
    }
}

impl CoverLetterService {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        jobs: Arc<dyn JobRepo>,
        profiles: Arc<dyn ProfileRepo>,
        letters: Arc<dyn LetterRepo>,
    ) -> Self {
        Self {
            llm,
            jobs,
            profiles,
            letters,
        }
    }

    async fn load(&self, user_id: i64, job_id: i64) -> Result<(UserProfile, JobRecord), DomainError> {
        let profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("profile {}", user_id)))?;
        let job = self
            .jobs
            .get_posting(job_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("posting {}", job_id)))?;
        Ok((profile, job))
    }

    /// Extracted recipient, or the neutral salutation of `language` when extraction fails
    /// or yields lines unfit for the letter.
    pub async fn recipient(&self, job_context: &str, language: Language) -> RecipientInfo {
        let answer = self
            .llm
            .complete_json(
                &prompts::recipient_system(language),
                &prompts::recipient_user(job_context),
            )
            .await;
        match answer {
            Ok(value) => {
                let info = parse_recipient(&value);
                if is_valid_recipient(&info) {
                    info
                } else {
                    debug!(?info, "extracted recipient rejected, using neutral salutation");
                    default_recipient(language)
                }
            }
            Err(e) => {
                warn!(error = %e, "recipient extraction failed, using neutral salutation");
                default_recipient(language)
            }
        }
    }

    /// Drafts and stores the letter for (user, posting), replacing an earlier one.
    pub async fn generate(&self, user_id: i64, job_id: i64) -> Result<CoverLetter, DomainError> {
        let (profile, job) = self.load(user_id, job_id).await?;
        let cv = profile
            .cv_text
            .as_deref()
            .map(str::trim)
            .filter(|cv| !cv.is_empty())
            .ok_or_else(|| {
                DomainError::Validation(format!("profile {} has no CV text", user_id))
            })?;

        let context = job.posting.context_block();
        let language = job.posting.language();
        info!(job = %job.posting.label(), %language, "drafting cover letter");

        let recipient = self.recipient(&context, language).await;

        let mut user_prompt = String::new();
        if let Some(reference) = profile
            .reference_letter
            .as_deref()
            .filter(|r| !r.trim().is_empty())
        {
            user_prompt.push_str(&prompts::reference_style(reference));
        }
        user_prompt.push_str(&prompts::letter_user(cv, &context, language));

        let answer = self
            .llm
            .complete_json(&prompts::letter_system(language), &user_prompt)
            .await?;
        let draft: CoverLetterDraft = serde_json::from_value(answer)
            .map_err(|e| DomainError::Ai(format!("letter answer has wrong shape: {}", e)))?;
        validate_draft(&draft)?;

        let letter = self
            .letters
            .save_letter(user_id, job_id, &draft, Some(&format_recipient(&recipient)))
            .await?;
        info!(letter_id = letter.id, chars = draft.total_len(), "cover letter stored");
        Ok(letter)
    }
}
