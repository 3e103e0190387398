use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    R,
    SR,
    SSR,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::R => "R",
            Rarity::SR => "SR",
            Rarity::SSR => "SSR",
        }
    }

    /// Highest level a card of this rarity can be raised to.
    pub fn max_level(&self) -> u32 {
        match self {
            Rarity::SSR => 50,
            Rarity::SR => 45,
            Rarity::R => 40,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "R" => Ok(Rarity::R),
            "SR" => Ok(Rarity::SR),
            "SSR" => Ok(Rarity::SSR),
            other => Err(format!("unknown rarity: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Speed,
    Stamina,
    Power,
    Guts,
    Wisdom,
    Friend,
    Group,
    Unknown,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Speed => "Speed",
            CardType::Stamina => "Stamina",
            CardType::Power => "Power",
            CardType::Guts => "Guts",
            CardType::Wisdom => "Wisdom",
            CardType::Friend => "Friend",
            CardType::Group => "Group",
            CardType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        [
            CardType::Speed,
            CardType::Stamina,
            CardType::Power,
            CardType::Guts,
            CardType::Wisdom,
            CardType::Friend,
            CardType::Group,
            CardType::Unknown,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| format!("unknown card type: {wanted}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub name: String,
    pub rarity: Rarity,
    pub card_type: CardType,
    pub max_level: u32,
    pub source_url: String,
    pub image_path: Option<String>,
}

impl CardRecord {
    pub fn new(name: String, rarity: Rarity, card_type: CardType, source_url: String) -> Self {
        Self {
            name,
            rarity,
            card_type,
            max_level: rarity.max_level(),
            source_url,
            image_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSample {
    pub level: u32,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintRecord {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub event_type: String,
}

/// Everything scraped for one card beyond the card row itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardDetails {
    pub effects: Vec<EffectSample>,
    pub hints: Vec<HintRecord>,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCard {
    pub id: i64,
    pub name: String,
    pub rarity: Rarity,
    pub card_type: CardType,
    pub max_level: u32,
    pub source_url: String,
    pub image_path: Option<String>,
    pub scraped_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub rarity: Option<Rarity>,
    pub card_type: Option<CardType>,
    pub search: Option<String>,
}
