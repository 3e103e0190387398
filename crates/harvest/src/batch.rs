use crate::asset::AssetFetcher;
use crate::builder::{ItemOutcome, RecordBuilder};
use crate::config::ScrapeConfig;
use browser::Page;
use crawler::{CrawlerError, Navigator};
use std::time::Duration;
use store::CardStore;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Listing navigation failed: {0}")]
    Navigator(#[from] CrawlerError),
    #[error("No item links found on {0}")]
    NoItems(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Progress line for the periodic checkpoint after `done` items.
    pub fn checkpoint(&self, done: usize) -> String {
        format!(
            "Progress: {}/{} cards ({} succeeded, {} failed)",
            done, self.total, self.succeeded, self.failed
        )
    }
}

/// One finished item, handed to the observer as the batch progresses.
pub struct ItemReport<'r> {
    /// 1-based position in the batch.
    pub index: usize,
    pub total: usize,
    pub url: &'r str,
    pub outcome: &'r ItemOutcome,
}

/// Receives batch progress. Both hooks default to doing nothing.
pub trait BatchObserver {
    fn started(&mut self, _total: usize) {}

    fn item_finished(&mut self, _report: &ItemReport<'_>) {}
}

impl BatchObserver for () {}

/// Enumerates the listing and scrapes every item on it, one at a time.
///
/// A failed item is counted and the batch moves on; only an unusable listing
/// aborts the run.
pub fn run_batch<P, S, F, O>(
    page: &P,
    store: &mut S,
    fetcher: &F,
    config: &ScrapeConfig,
    observer: &mut O,
) -> Result<BatchSummary, HarvestError>
where
    P: Page + ?Sized,
    S: CardStore + ?Sized,
    F: AssetFetcher + ?Sized,
    O: BatchObserver + ?Sized,
{
    let listing_url = config.listing_url();
    let navigator = Navigator::new(config.listing.clone())?;
    let mut urls = navigator.enumerate_item_urls(page, &listing_url)?;
    if urls.is_empty() {
        return Err(HarvestError::NoItems(listing_url));
    }
    if let Some(limit) = config.max_items {
        urls.truncate(limit);
    }

    let mut summary = BatchSummary {
        total: urls.len(),
        ..BatchSummary::default()
    };
    info!("Scraping {} support cards", summary.total);
    observer.started(summary.total);

    let mut builder = RecordBuilder::new(page, store, fetcher, config);
    for (i, url) in urls.iter().enumerate() {
        let index = i + 1;
        let outcome = builder.scrape_item(url);
        if outcome.is_success() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
            warn!("Failed to scrape {}", url);
        }

        observer.item_finished(&ItemReport {
            index,
            total: summary.total,
            url,
            outcome: &outcome,
        });

        if config.progress_every > 0 && index % config.progress_every == 0 {
            info!("{}", summary.checkpoint(index));
        }
        page.pause(Duration::from_millis(config.item_pause_ms));
    }

    info!(
        "Scraping complete: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    );
    Ok(summary)
}
