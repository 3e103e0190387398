//! Scrapes every support card on the listing into a [`store::CardStore`].

pub mod asset;
pub mod batch;
pub mod builder;
pub mod card;
pub mod config;

pub use asset::{AssetError, AssetFetcher, HttpFetcher};
pub use batch::{run_batch, BatchObserver, BatchSummary, HarvestError, ItemReport};
pub use builder::{ItemOutcome, RecordBuilder, ScrapeError, ScrapedCard};
pub use config::{AssetConfig, ConfigError, ScrapeConfig};
