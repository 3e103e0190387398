use browser::{BrowserError, NavigationOptions, Page};
use indexmap::IndexSet;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// One lazy-load pass: scroll to the bottom `iterations` times, pausing between each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollPass {
    pub iterations: u32,
    pub pause_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub navigation: NavigationOptions,
    /// Substring every candidate anchor href must contain.
    pub item_path_marker: String,
    /// Pattern the item URL path must match.
    pub item_path_pattern: String,
    pub first_pass: ScrollPass,
    /// Pause after jumping back to the top, before the second pass.
    pub rewind_pause_ms: u64,
    pub second_pass: ScrollPass,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            navigation: NavigationOptions {
                settle_ms: 0,
                ..NavigationOptions::default()
            },
            item_path_marker: "/umamusume/supports/".to_string(),
            item_path_pattern: r"/supports/\d+-".to_string(),
            first_pass: ScrollPass {
                iterations: 30,
                pause_ms: 400,
            },
            rewind_pause_ms: 500,
            second_pass: ScrollPass {
                iterations: 10,
                pause_ms: 300,
            },
        }
    }
}

/// Discovers item page URLs on a lazily-loaded listing page.
pub struct Navigator {
    config: ListingConfig,
    item_path: Regex,
}

impl Navigator {
    pub fn new(config: ListingConfig) -> Result<Self, CrawlerError> {
        let item_path = Regex::new(&config.item_path_pattern)
            .map_err(|e| CrawlerError::ParseError(e.to_string()))?;
        Ok(Self { config, item_path })
    }

    /// Loads the listing, runs both scroll passes and returns the sorted, de-duplicated item URLs.
    ///
    /// An empty result means the listing did not render its items; callers should
    /// treat it as a hard stop.
    pub fn enumerate_item_urls<P: Page + ?Sized>(
        &self,
        page: &P,
        listing_url: &str,
    ) -> Result<Vec<String>, CrawlerError> {
        info!("Loading listing page: {}", listing_url);
        page.navigate(listing_url, &self.config.navigation)?;

        info!("Scrolling to load all items...");
        self.scroll_pass(page, &self.config.first_pass)?;
        page.scroll_to_top()?;
        page.pause(Duration::from_millis(self.config.rewind_pause_ms));
        self.scroll_pass(page, &self.config.second_pass)?;

        let content = page.content()?;
        let mut links: Vec<String> = self
            .extract_item_links(&content, listing_url)?
            .into_iter()
            .collect();
        links.sort();

        info!("Found {} item pages", links.len());
        Ok(links)
    }

    fn scroll_pass<P: Page + ?Sized>(&self, page: &P, pass: &ScrollPass) -> Result<(), CrawlerError> {
        for _ in 0..pass.iterations {
            page.scroll_to_bottom()?;
            page.pause(Duration::from_millis(pass.pause_ms));
        }
        Ok(())
    }

    /// Absolute item URLs found in `html`, in document order without duplicates.
    pub fn extract_item_links(&self, html: &str, current_url: &str) -> Result<IndexSet<String>, CrawlerError> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("a[href]")
            .map_err(|e| CrawlerError::ParseError(e.to_string()))?;

        let current = Url::parse(current_url)
            .map_err(|e| CrawlerError::InvalidUrl(e.to_string()))?;

        let mut links = IndexSet::new();

        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !href.contains(&self.config.item_path_marker) {
                continue;
            }
            if let Ok(mut url) = current.join(href) {
                url.set_fragment(None);
                if self.item_path.is_match(url.path()) {
                    links.insert(url.to_string());
                }
            }
        }

        debug!("Extracted {} item links from {}", links.len(), current_url);
        Ok(links)
    }
}
