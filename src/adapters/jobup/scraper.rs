//! Implements JobSource for jobup.ch over plain HTTPS.

use crate::adapters::jobup::parser::parse_search_page;
use crate::adapters::jobup::urls::search_url;
use crate::domain::{DomainError, Platform, SearchPage, SearchQuery};
use crate::ports::JobSource;
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct JobUpSource {
    client: reqwest::Client,
    search_url: String,
    user_agent: String,
}

impl JobUpSource {
    pub fn new(search_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_url: search_url.into(),
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait::async_trait]
impl JobSource for JobUpSource {
    fn platform(&self) -> Platform {
        Platform::JobUp
    }

    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<SearchPage, DomainError> {
        // Page 1 is the bare search URL.
        let page_param = (page > 1).then_some(page);
        let url = search_url(&self.search_url, query, page_param)?;
        debug!(url = %url, page, "fetching jobup result page");

        let response = self
            .client
            .get(url.clone())
            .timeout(REQUEST_TIMEOUT)
            .header("User-Agent", &self.user_agent)
            .header("Accept-Language", "fr-CH,fr;q=0.9")
            .send()
            .await
            .map_err(|e| DomainError::Source(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %url, "jobup returned error");
            return Err(DomainError::Source(format!("GET {}: HTTP {}", url, status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| DomainError::Source(format!("read body of {}: {}", url, e)))?;
        let parsed = parse_search_page(&html, &url)?;
        info!(
            page,
            total_pages = parsed.total_pages,
            postings = parsed.postings.len(),
            "jobup page parsed"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const FIXTURE: &str = include_str!("../../../tests/fixtures/jobup_search.html");

    #[tokio::test]
    async fn fetches_and_parses_requested_page() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/fr/emplois/")
                .query_param("term", "rust")
                .query_param("page", "2")
                .header("User-Agent", "jobfinder-test");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .body(FIXTURE);
        });

        let source = JobUpSource::new(server.url("/fr/emplois/"), "jobfinder-test");
        let query = SearchQuery::default().with_term("rust");
        let page = source.fetch_page(&query, 2).await.unwrap();

        mock.assert();
        assert_eq!(page.postings.len(), 2);
        assert_eq!(page.total_pages, 7);
        assert!(page.postings[0].url.starts_with(&server.base_url()));
    }

    #[tokio::test]
    async fn http_error_is_a_source_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/fr/emplois/");
            then.status(503);
        });

        let source = JobUpSource::new(server.url("/fr/emplois/"), "jobfinder-test");
        assert!(matches!(
            source.fetch_page(&SearchQuery::default(), 1).await,
            Err(DomainError::Source(_))
        ));
    }
}
