//! Scraping: job source -> exclusion filter -> store.
//!
//! Page 1 is fetched first to learn the page count; the remaining pages are fetched
//! concurrently, bounded by a semaphore. Page tasks feed a bounded channel drained by a
//! single writer task, so the store sees one upsert at a time.

use crate::domain::{DomainError, JobPosting, SearchPage, SearchQuery};
use crate::ports::{JobRepo, JobSource};
use futures_util::stream::{self, Stream, TryStreamExt};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 3;
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Outcome of one scrape run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub new_postings: usize,
    pub known_postings: usize,
    pub excluded: usize,
    /// Postings the store rejected.
    pub write_errors: usize,
}

struct Cursor {
    next: u32,
    total: Option<u32>,
}

/// Lazy page sequence: page 1 first, following pages only as the consumer pulls.
/// Ends after the last advertised page, the first empty page, or the first error.
pub fn search_pages(
    source: Arc<dyn JobSource>,
    query: SearchQuery,
) -> impl Stream<Item = Result<SearchPage, DomainError>> + Send {
    stream::try_unfold(
        Cursor {
            next: 1,
            total: None,
        },
        move |cursor| {
            let source = Arc::clone(&source);
            let query = query.clone();
            async move {
                if cursor.total.is_some_and(|total| cursor.next > total) {
                    return Ok(None);
                }
                let page = source.fetch_page(&query, cursor.next).await?;
                if page.postings.is_empty() {
                    return Ok(None);
                }
                let total = cursor.total.unwrap_or(page.total_pages.max(1));
                Ok(Some((
                    page,
                    Cursor {
                        next: cursor.next + 1,
                        total: Some(total),
                    },
                )))
            }
        },
    )
}

/// Lazy posting sequence over `search_pages`.
pub fn search_postings(
    source: Arc<dyn JobSource>,
    query: SearchQuery,
) -> impl Stream<Item = Result<JobPosting, DomainError>> + Send {
    search_pages(source, query)
        .map_ok(|page| stream::iter(page.postings.into_iter().map(Ok)))
        .try_flatten()
}

pub struct ScrapeService {
    source: Arc<dyn JobSource>,
    jobs: Arc<dyn JobRepo>,
    max_concurrent_pages: usize,
    buffer_size: usize,
}

impl ScrapeService {
    pub fn new(source: Arc<dyn JobSource>, jobs: Arc<dyn JobRepo>) -> Self {
        Self {
            source,
            jobs,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_limits(mut self, max_concurrent_pages: usize, buffer_size: usize) -> Self {
        self.max_concurrent_pages = max_concurrent_pages.max(1);
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn source(&self) -> Arc<dyn JobSource> {
        Arc::clone(&self.source)
    }

    /// Scrape every page of `query` into the store, dropping postings matching `exclusions`.
    /// Fails only when page 1 cannot be fetched.
    pub async fn scrape(
        &self,
        query: &SearchQuery,
        exclusions: &[String],
    ) -> Result<ScrapeStats, DomainError> {
        info!(term = query.term.as_deref().unwrap_or(""), "scrape started");
        let first = self.source.fetch_page(query, 1).await?;
        let total_pages = first.total_pages.max(1);

        let (tx, rx) = mpsc::channel::<JobPosting>(self.buffer_size);
        let writer = tokio::spawn(write_postings(Arc::clone(&self.jobs), rx));

        let mut stats = ScrapeStats {
            pages_fetched: 1,
            ..ScrapeStats::default()
        };
        let first_empty = first.postings.is_empty();
        stats.excluded += forward(first.postings, exclusions, &tx).await;

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_pages));
        let mut tasks = JoinSet::new();
        if !first_empty {
            for page in 2..=total_pages {
                let sem = Arc::clone(&semaphore);
                let source = Arc::clone(&self.source);
                let query = query.clone();
                let exclusions = exclusions.to_vec();
                let tx = tx.clone();
                tasks.spawn(async move {
                    let _permit = sem
                        .acquire()
                        .await
                        .map_err(|e| DomainError::Source(format!("page limiter closed: {}", e)))?;
                    let result = source.fetch_page(&query, page).await;
                    match result {
                        Ok(found) => Ok(forward(found.postings, &exclusions, &tx).await),
                        Err(e) => {
                            warn!(page, error = %e, "page fetch failed");
                            Err(e)
                        }
                    }
                });
            }
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(excluded)) => {
                    stats.pages_fetched += 1;
                    stats.excluded += excluded;
                }
                Ok(Err(_)) => stats.pages_failed += 1,
                Err(e) => {
                    warn!(error = %e, "page task panicked");
                    stats.pages_failed += 1;
                }
            }
        }

        let written = writer
            .await
            .map_err(|e| DomainError::Repo(format!("store writer failed: {}", e)))?;
        stats.new_postings = written.new_postings;
        stats.known_postings = written.known_postings;
        stats.write_errors = written.write_errors;

        info!(
            pages = stats.pages_fetched,
            failed_pages = stats.pages_failed,
            new = stats.new_postings,
            known = stats.known_postings,
            excluded = stats.excluded,
            "scrape finished"
        );
        Ok(stats)
    }
}

/// Sends non-excluded postings to the writer; returns how many were excluded.
async fn forward(
    postings: Vec<JobPosting>,
    exclusions: &[String],
    tx: &mpsc::Sender<JobPosting>,
) -> usize {
    let mut excluded = 0;
    for posting in postings {
        if posting.matches_any(exclusions) {
            debug!(posting = %posting.label(), "excluded");
            excluded += 1;
            continue;
        }
        if tx.send(posting).await.is_err() {
            warn!("store writer stopped; dropping remaining postings");
            break;
        }
    }
    excluded
}

#[derive(Default)]
struct Written {
    new_postings: usize,
    known_postings: usize,
    write_errors: usize,
}

async fn write_postings(jobs: Arc<dyn JobRepo>, mut rx: mpsc::Receiver<JobPosting>) -> Written {
    let mut written = Written::default();
    while let Some(posting) = rx.recv().await {
        let result = match posting.validate() {
            Ok(()) => jobs.upsert_posting(&posting).await,
            Err(e) => Err(e),
        };
        match result {
            Ok((_, true)) => written.new_postings += 1,
            Ok((_, false)) => written.known_postings += 1,
            Err(e) => {
                warn!(external_id = %posting.external_id, error = %e, "posting not stored");
                written.write_errors += 1;
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{FakeSource, InMemory, posting};
    use futures_util::StreamExt;

    fn ids(prefix: &str, n: usize) -> Vec<JobPosting> {
        (0..n)
            .map(|i| posting(&format!("{}{}", prefix, i), i % 2 == 0))
            .collect()
    }

    #[tokio::test]
    async fn stream_fetches_pages_only_when_pulled() {
        let source = FakeSource::new(vec![Ok(ids("a", 2)), Ok(ids("b", 2)), Ok(ids("c", 2))]);
        let stream = search_postings(source.clone(), SearchQuery::default());
        futures_util::pin_mut!(stream);

        let first: Vec<_> = stream.as_mut().take(2).collect().await;
        assert_eq!(first.len(), 2);
        assert_eq!(source.calls.lock().unwrap().len(), 1);

        let rest: Vec<_> = stream.collect().await;
        assert_eq!(rest.len(), 4);
        let pages: Vec<u32> = source.calls.lock().unwrap().iter().map(|c| c.1).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn stream_ends_after_error_or_empty_page() {
        let source = FakeSource::new(vec![Ok(ids("a", 1)), Err("boom".into()), Ok(ids("c", 1))]);
        let items: Vec<_> = search_postings(source.clone(), SearchQuery::default())
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(DomainError::Source(_))));

        let empty = FakeSource::new(vec![Ok(ids("a", 1)), Ok(Vec::new()), Ok(ids("c", 1))]);
        let items: Vec<_> = search_postings(empty.clone(), SearchQuery::default())
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(empty.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn scrape_stores_new_counts_known_and_survives_page_errors() {
        let store = InMemory::new();
        store.add_posting(posting("a0", true)).await;
        let source = FakeSource::new(vec![
            Ok(ids("a", 3)),
            Err("timeout".into()),
            Ok(ids("c", 2)),
        ]);
        let service = ScrapeService::new(source.clone(), store.clone()).with_limits(2, 1);

        let stats = service.scrape(&SearchQuery::default(), &[]).await.unwrap();
        assert_eq!(stats.pages_fetched, 2);
        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.new_postings, 4);
        assert_eq!(stats.known_postings, 1);
        assert_eq!(store.postings.lock().unwrap().len(), 5);

        let mut pages: Vec<u32> = source.calls.lock().unwrap().iter().map(|c| c.1).collect();
        pages.sort();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn exclusions_are_dropped_before_the_store() {
        let store = InMemory::new();
        let mut java = posting("java1", false);
        java.title = Some("Senior Java Developer".into());
        let source = FakeSource::new(vec![Ok(vec![java, posting("rust1", false)])]);
        let service = ScrapeService::new(source, store.clone());

        let stats = service
            .scrape(&SearchQuery::default(), &["java".to_string()])
            .await
            .unwrap();
        assert_eq!(stats.excluded, 1);
        assert_eq!(stats.new_postings, 1);
    }

    #[tokio::test]
    async fn first_page_failure_is_surfaced() {
        let store = InMemory::new();
        let source = FakeSource::new(vec![Err("dns".into())]);
        let service = ScrapeService::new(source, store);
        assert!(service.scrape(&SearchQuery::default(), &[]).await.is_err());
    }
}
