use crate::asset::{save_portrait, AssetFetcher};
use crate::card::{card_name, portrait_url, read_page_info};
use crate::config::ScrapeConfig;
use browser::{BrowserError, Page};
use extractor::{event_names, extract_effects, hint_names, LevelStepper, Snapshot};
use scraper::Html;
use std::time::Duration;
use store::{CardDetails, CardRecord, CardStore, EffectSample, EventRecord, HintRecord, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

const EVENT_TYPE: &str = "Event";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
    #[error("Page {url} has no usable card title")]
    DegenerateTitle { url: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A card that was written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedCard {
    pub card_id: i64,
    pub record: CardRecord,
    /// Levels the page actually showed, one per sampled key level.
    pub levels: Vec<u32>,
    pub details: CardDetails,
}

#[derive(Debug)]
pub enum ItemOutcome {
    Scraped { card: ScrapedCard, attempts: u32 },
    /// The page rendered without a card title; never retried.
    Skipped { url: String },
    Failed { error: ScrapeError, attempts: u32 },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Scraped { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ItemOutcome::Scraped { attempts, .. } | ItemOutcome::Failed { attempts, .. } => {
                *attempts
            }
            ItemOutcome::Skipped { .. } => 1,
        }
    }
}

/// Turns one item page into a stored card with its per-level effects, hints and events.
pub struct RecordBuilder<'a, P, S, F>
where
    P: Page + ?Sized,
    S: CardStore + ?Sized,
    F: AssetFetcher + ?Sized,
{
    page: &'a P,
    store: &'a mut S,
    fetcher: &'a F,
    config: &'a ScrapeConfig,
}

impl<'a, P, S, F> RecordBuilder<'a, P, S, F>
where
    P: Page + ?Sized,
    S: CardStore + ?Sized,
    F: AssetFetcher + ?Sized,
{
    pub fn new(page: &'a P, store: &'a mut S, fetcher: &'a F, config: &'a ScrapeConfig) -> Self {
        Self {
            page,
            store,
            fetcher,
            config,
        }
    }

    /// Scrapes `url`, retrying transient failures with a fixed backoff.
    pub fn scrape_item(&mut self, url: &str) -> ItemOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.scrape_once(url) {
                Ok(card) => {
                    return ItemOutcome::Scraped {
                        card,
                        attempts: attempt,
                    }
                }
                Err(ScrapeError::DegenerateTitle { url }) => {
                    warn!("Skipping {}: no card title on page", url);
                    return ItemOutcome::Skipped { url };
                }
                Err(error) if attempt < max_attempts => {
                    warn!("Attempt {}/{} failed for {}: {}", attempt, max_attempts, url, error);
                    self.page
                        .pause(Duration::from_millis(self.config.retry_backoff_ms));
                    attempt += 1;
                }
                Err(error) => {
                    warn!("Giving up on {} after {} attempts: {}", url, attempt, error);
                    return ItemOutcome::Failed {
                        error,
                        attempts: attempt,
                    };
                }
            }
        }
    }

    fn scrape_once(&mut self, url: &str) -> Result<ScrapedCard, ScrapeError> {
        self.page.navigate(url, &self.config.item_navigation)?;
        let document = Html::parse_document(&self.page.content()?);

        let info = read_page_info(&document);
        let name = card_name(&info.title).ok_or_else(|| ScrapeError::DegenerateTitle {
            url: url.to_string(),
        })?;
        let mut record = CardRecord::new(
            name,
            self.config.rarity_for(info.rarity_src.as_deref()),
            self.config.card_type_for(info.type_src.as_deref()),
            url.to_string(),
        );
        info!(
            "Scraping: {} | {} | {} | Max Level: {}",
            record.name, record.rarity, record.card_type, record.max_level
        );

        let card_id = self.store.upsert_card(&record)?;
        if let Some(path) = self.attach_portrait(&document, url, card_id, &record.name) {
            record.image_path = Some(path);
        }

        let mut details = CardDetails::default();
        let mut levels = Vec::new();
        let stepper = LevelStepper::new(self.page, &self.config.stepper);

        for target in self.config.levels_for(record.max_level) {
            let level = stepper.set_level(target)?;
            let effects = extract_effects(&Snapshot::capture(self.page)?);
            info!("  Level {}: {} effects", level, effects.len());

            levels.push(level);
            details
                .effects
                .extend(effects.into_iter().map(|effect| EffectSample {
                    level,
                    name: effect.name,
                    value: effect.value,
                }));
        }

        let text = self.page.inner_text()?;
        details.hints = hint_names(&text, &self.config.sections)
            .into_iter()
            .map(|name| HintRecord {
                name,
                description: String::new(),
            })
            .collect();
        details.events = event_names(&text, &self.config.sections)
            .into_iter()
            .map(|name| EventRecord {
                name,
                event_type: EVENT_TYPE.to_string(),
            })
            .collect();
        debug!(
            card_id,
            effects = details.effects.len(),
            hints = details.hints.len(),
            events = details.events.len(),
            "Writing card details"
        );

        self.store.replace_details(card_id, &details)?;

        Ok(ScrapedCard {
            card_id,
            record,
            levels,
            details,
        })
    }

    /// Portrait failures are logged and never fail the item.
    fn attach_portrait(
        &mut self,
        document: &Html,
        url: &str,
        card_id: i64,
        name: &str,
    ) -> Option<String> {
        let asset = &self.config.asset;
        let Some(image_url) = portrait_url(document, url, &asset.host_marker, asset.min_dimension)
        else {
            debug!(card_id, "No portrait found");
            return None;
        };

        let path = match save_portrait(
            self.fetcher,
            &image_url,
            &self.config.images_dir,
            card_id,
            name,
        ) {
            Ok(path) => path,
            Err(e) => {
                warn!("Could not download portrait {}: {}", image_url, e);
                return None;
            }
        };

        let path = path.to_string_lossy().into_owned();
        match self.store.set_image_path(card_id, &path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Could not record portrait path for card {}: {}", card_id, e);
                None
            }
        }
    }
}
