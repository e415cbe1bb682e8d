//! Keyword scheduler: scrape one keyword per cycle, auto-apply, rotate, sleep.
//!
//! Does not block the caller's thread; sleeps with tokio::time::sleep and stops when the
//! shutdown channel flips to true.

use crate::domain::DomainError;
use crate::ports::{ProfileRepo, SettingsPort};
use crate::usecases::{ApplyService, ScrapeService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Keyword list with a wrapping cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    keywords: Vec<String>,
    cursor: usize,
}

impl Rotation {
    pub fn new(keywords: Vec<String>) -> Result<Self, DomainError> {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(DomainError::Config(
                "scheduler needs at least one keyword".into(),
            ));
        }
        Ok(Self {
            keywords,
            cursor: 0,
        })
    }

    pub fn current(&self) -> &str {
        &self.keywords[self.cursor]
    }

    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.keywords.len();
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

pub struct KeywordScheduler {
    scrape: Arc<ScrapeService>,
    apply: Arc<ApplyService>,
    settings: Arc<dyn SettingsPort>,
    profiles: Arc<dyn ProfileRepo>,
    user_id: i64,
    interval: Duration,
    max_applications: Option<usize>,
}

impl KeywordScheduler {
    pub fn new(
        scrape: Arc<ScrapeService>,
        apply: Arc<ApplyService>,
        settings: Arc<dyn SettingsPort>,
        profiles: Arc<dyn ProfileRepo>,
        user_id: i64,
        interval: Duration,
        max_applications: Option<usize>,
    ) -> Self {
        Self {
            scrape,
            apply,
            settings,
            profiles,
            user_id,
            interval,
            max_applications,
        }
    }

    /// One cycle: scrape `keyword` with the stored filters, then auto-apply.
    async fn cycle(&self, keyword: &str) -> Result<(), DomainError> {
        let settings = self.settings.load().await?;
        let exclusions = self
            .profiles
            .get_profile(self.user_id)
            .await?
            .map(|p| p.preferences.exclusions)
            .unwrap_or_default();

        let stats = self
            .scrape
            .scrape(&settings.filters.with_term(keyword), &exclusions)
            .await?;
        info!(keyword, new = stats.new_postings, "keyword scraped");

        let report = self
            .apply
            .auto_apply(self.user_id, self.max_applications)
            .await?;
        info!(keyword, submitted = report.submitted, failed = report.failed, "cycle applied");
        Ok(())
    }

    /// Runs cycles until `shutdown` turns true. Keywords come from the settings file.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut rotation = Rotation::new(self.settings.load().await?.keywords)?;
        info!(
            keywords = rotation.len(),
            interval_secs = self.interval.as_secs(),
            "scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            let keyword = rotation.current().to_string();
            if let Err(e) = self.cycle(&keyword).await {
                warn!(keyword = %keyword, error = %e, "scheduler cycle failed");
            }
            rotation.advance();

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    // sender dropped counts as shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("scheduler stopped");
        Ok(())
    }
}
