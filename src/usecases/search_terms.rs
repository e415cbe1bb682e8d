//! Search term generation: CV + preferences -> job titles -> search queries.

use crate::domain::{DomainError, Language, SearchQuery, UserProfile};
use crate::ports::{LlmPort, ProfileRepo, SettingsPort};
use crate::usecases::prompts;
use std::sync::Arc;
use tracing::{info, warn};

pub const MAX_TERMS: usize = 5;

/// Trims, drops empty and excluded terms, de-duplicates case-insensitively, caps at `MAX_TERMS`.
pub fn normalize_terms(raw: &[String], exclusions: &[String]) -> Vec<String> {
    let exclusions: Vec<String> = exclusions
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    let mut seen: Vec<String> = Vec::new();
    let mut terms = Vec::new();
    for term in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let lower = term.to_lowercase();
        if seen.contains(&lower) || exclusions.iter().any(|e| lower.contains(e)) {
            continue;
        }
        seen.push(lower);
        terms.push(term.to_string());
        if terms.len() == MAX_TERMS {
            break;
        }
    }
    terms
}

pub struct SearchTermGenerator {
    llm: Arc<dyn LlmPort>,
    profiles: Arc<dyn ProfileRepo>,
    settings: Arc<dyn SettingsPort>,
}

impl SearchTermGenerator {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        profiles: Arc<dyn ProfileRepo>,
        settings: Arc<dyn SettingsPort>,
    ) -> Self {
        Self {
            llm,
            profiles,
            settings,
        }
    }

    async fn profile(&self, user_id: i64) -> Result<UserProfile, DomainError> {
        self.profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("profile {}", user_id)))
    }

    async fn ask_model(
        &self,
        profile: &UserProfile,
        language: Language,
    ) -> Result<Vec<String>, DomainError> {
        let cv = profile
            .cv_text
            .as_deref()
            .map(str::trim)
            .filter(|cv| !cv.is_empty())
            .ok_or_else(|| DomainError::Validation("profile has no CV text".into()))?;
        let answer = self
            .llm
            .complete_json(
                prompts::keywords_system(),
                &prompts::keywords_user(cv, &profile.preferences, language),
            )
            .await?;
        let keywords = answer
            .get("keywords")
            .and_then(|k| k.as_array())
            .ok_or_else(|| DomainError::Ai("answer has no `keywords` list".into()))?;
        Ok(keywords
            .iter()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect())
    }

    /// Job titles for the profile; preferred titles when the model fails or yields nothing.
    pub async fn generate_terms(
        &self,
        user_id: i64,
        language: Language,
    ) -> Result<Vec<String>, DomainError> {
        let profile = self.profile(user_id).await?;
        let exclusions = &profile.preferences.exclusions;

        let model_error = match self.ask_model(&profile, language).await {
            Ok(raw) => {
                let terms = normalize_terms(&raw, exclusions);
                if !terms.is_empty() {
                    info!(user_id, terms = ?terms, "generated search terms");
                    return Ok(terms);
                }
                DomainError::Ai("model returned no usable job titles".into())
            }
            Err(e) => e,
        };

        let fallback = normalize_terms(&profile.preferences.titles, exclusions);
        if fallback.is_empty() {
            return Err(model_error);
        }
        warn!(user_id, error = %model_error, "search term generation failed, using preferred titles");
        Ok(fallback)
    }

    /// One query per term, carrying the stored scraping filters.
    pub async fn generate_queries(
        &self,
        user_id: i64,
        language: Language,
    ) -> Result<Vec<SearchQuery>, DomainError> {
        let terms = self.generate_terms(user_id, language).await?;
        let filters = self.settings.load().await?.filters;
        Ok(terms.into_iter().map(|t| filters.with_term(t)).collect())
    }

    /// Generates terms and stores them as the scheduler keyword list.
    pub async fn refresh_keywords(
        &self,
        user_id: i64,
        language: Language,
    ) -> Result<Vec<String>, DomainError> {
        let terms = self.generate_terms(user_id, language).await?;
        let mut settings = self.settings.load().await?;
        settings.keywords = terms.clone();
        self.settings.save(&settings).await?;
        Ok(terms)
    }
}
