use browser::NavigationOptions;
use crawler::ListingConfig;
use extractor::{SectionLimits, StepperConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use store::{CardType, Rarity};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub timeout_ms: u64,
    /// Host path fragment an image needs, together with a large size, to count as card art.
    pub host_marker: String,
    pub min_dimension: u32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10000,
            host_marker: "umamusume".to_string(),
            min_dimension: 100,
        }
    }
}

/// Everything a scrape run needs to know, fixed for the duration of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub listing_path: String,
    /// Levels at which effects are sampled; filtered by each card's max level.
    pub key_levels: Vec<u32>,
    /// Image filename fragment to rarity, checked in order.
    pub rarity_markers: Vec<(String, Rarity)>,
    /// Image filename fragment to card type, checked in order.
    pub type_markers: Vec<(String, CardType)>,
    pub listing: ListingConfig,
    pub item_navigation: NavigationOptions,
    pub stepper: StepperConfig,
    pub sections: SectionLimits,
    pub asset: AssetConfig,
    pub images_dir: PathBuf,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub item_pause_ms: u64,
    pub progress_every: usize,
    pub max_items: Option<usize>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gametora.com".to_string(),
            listing_path: "/umamusume/supports".to_string(),
            key_levels: vec![1, 25, 40, 50],
            rarity_markers: vec![
                ("rarity_01".to_string(), Rarity::R),
                ("rarity_02".to_string(), Rarity::SR),
                ("rarity_03".to_string(), Rarity::SSR),
            ],
            type_markers: vec![
                ("obtain_00".to_string(), CardType::Speed),
                ("obtain_01".to_string(), CardType::Stamina),
                ("obtain_02".to_string(), CardType::Power),
                ("obtain_03".to_string(), CardType::Guts),
                ("obtain_04".to_string(), CardType::Wisdom),
                ("obtain_05".to_string(), CardType::Friend),
                ("obtain_06".to_string(), CardType::Group),
            ],
            listing: ListingConfig::default(),
            item_navigation: NavigationOptions::default(),
            stepper: StepperConfig::default(),
            sections: SectionLimits::default(),
            asset: AssetConfig::default(),
            images_dir: PathBuf::from("images"),
            max_attempts: 3,
            retry_backoff_ms: 1000,
            item_pause_ms: 300,
            progress_every: 50,
            max_items: None,
        }
    }
}

impl ScrapeConfig {
    /// Reads a JSON config; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded scrape config from {:?}", path);
        Ok(config)
    }

    pub fn listing_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.listing_path.trim_start_matches('/')
        )
    }

    /// Key levels a card with `max_level` can reach, in configured order.
    pub fn levels_for(&self, max_level: u32) -> Vec<u32> {
        self.key_levels
            .iter()
            .copied()
            .filter(|level| (1..=max_level).contains(level))
            .collect()
    }

    /// Rarity named by the rarity icon's source, `R` when nothing matches.
    pub fn rarity_for(&self, image_src: Option<&str>) -> Rarity {
        image_src
            .and_then(|src| lookup(&self.rarity_markers, src))
            .unwrap_or(Rarity::R)
    }

    /// Card type named by the type icon's source, `Unknown` when nothing matches.
    pub fn card_type_for(&self, image_src: Option<&str>) -> CardType {
        image_src
            .and_then(|src| lookup(&self.type_markers, src))
            .unwrap_or(CardType::Unknown)
    }
}

fn lookup<T: Copy>(table: &[(String, T)], src: &str) -> Option<T> {
    table
        .iter()
        .find(|(marker, _)| src.contains(marker.as_str()))
        .map(|(_, value)| *value)
}
