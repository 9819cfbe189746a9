//! Batch ingestion: fetch a set of sheet pages, extract them, and write each
//! one. Fan-out is bounded to stay polite with the source site; one bad sheet
//! is counted and skipped, never fatal to the batch.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use scraper::Html;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::clients::SheetFetcher;
use crate::config::IngestConfig;
use crate::db::Store;
use crate::models::filter::ContentPolicy;
use crate::models::title::UpsertOutcome;
use crate::scrape::SheetExtractor;

/// What one batch did, sheet by sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestReport {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }
}

enum SheetOutcome {
    Created,
    Updated,
    Skipped,
    Failed,
}

pub struct IngestService {
    store: Store,
    fetcher: Arc<dyn SheetFetcher>,
    policy: ContentPolicy,
    fetch_concurrency: usize,
    planning_snapshots: bool,
}

impl IngestService {
    #[must_use]
    pub fn new(
        store: Store,
        fetcher: Arc<dyn SheetFetcher>,
        policy: ContentPolicy,
        config: &IngestConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            policy,
            fetch_concurrency: config.fetch_concurrency.max(1),
            planning_snapshots: config.planning_snapshots,
        }
    }

    /// Fetches and stores every given sheet with at most `fetch_concurrency`
    /// pages in flight. Cancelling stops new fetches; sheets already past
    /// their fetch finish or roll back on their own.
    pub async fn ingest_urls(&self, urls: Vec<Url>, cancel: &CancellationToken) -> IngestReport {
        let semaphore = Arc::new(Semaphore::new(self.fetch_concurrency));
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            let semaphore = Arc::clone(&semaphore);
            let store = self.store.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let policy = self.policy;
            let planning = self.planning_snapshots;
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return SheetOutcome::Failed;
                };
                if cancel.is_cancelled() {
                    return SheetOutcome::Skipped;
                }
                ingest_one(&store, fetcher.as_ref(), &url, policy, planning, &cancel).await
            }));
        }

        let mut report = IngestReport::default();
        for joined in join_all(handles).await {
            match joined {
                Ok(SheetOutcome::Created) => report.created += 1,
                Ok(SheetOutcome::Updated) => report.updated += 1,
                Ok(SheetOutcome::Skipped) => report.skipped += 1,
                Ok(SheetOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    warn!("Ingest worker panicked: {e}");
                    report.failed += 1;
                }
            }
        }

        info!(
            "Ingest batch done: {} created, {} updated, {} skipped, {} failed",
            report.created, report.updated, report.skipped, report.failed
        );
        report
    }

    /// Extracts and stores a page the caller already fetched (or read from
    /// disk). Returns `None` when the sheet is dropped by the content policy.
    pub async fn ingest_document(
        &self,
        html: &str,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Option<UpsertOutcome>> {
        store_document(
            &self.store,
            html,
            url,
            self.policy,
            self.planning_snapshots,
            cancel,
        )
        .await
    }
}

async fn ingest_one(
    store: &Store,
    fetcher: &dyn SheetFetcher,
    url: &Url,
    policy: ContentPolicy,
    planning: bool,
    cancel: &CancellationToken,
) -> SheetOutcome {
    let stored = async {
        let html = fetcher.fetch_page(url).await?;
        store_document(store, &html, url, policy, planning, cancel).await
    }
    .await;

    match stored {
        Ok(Some(outcome)) if outcome.created => SheetOutcome::Created,
        Ok(Some(_)) => SheetOutcome::Updated,
        Ok(None) => SheetOutcome::Skipped,
        Err(e) => {
            warn!("Sheet {url} failed: {e:#}");
            SheetOutcome::Failed
        }
    }
}

async fn store_document(
    store: &Store,
    html: &str,
    url: &Url,
    policy: ContentPolicy,
    planning: bool,
    cancel: &CancellationToken,
) -> Result<Option<UpsertOutcome>> {
    // The parsed tree is not Send; it must not outlive this block.
    let record = {
        let document = Html::parse_document(html);
        SheetExtractor::extract(&document, url)
    }?;

    if (record.is_adult && !policy.allow_adult) || (record.is_explicit && !policy.allow_explicit) {
        info!("Skipping '{}' under the content policy", record.name);
        return Ok(None);
    }

    let outcome = store.upsert_title(&record, cancel).await?;
    if planning {
        store.capture_planning(&record, cancel).await?;
    }
    Ok(Some(outcome))
}
