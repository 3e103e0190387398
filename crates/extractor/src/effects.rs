use crate::{element_text, Snapshot};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Elements of the effect panel carry a hashed class name starting with this marker.
static EFFECT_BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="effect__"]"#).expect("hardcoded selector is valid")
});

const LOCKED_MARKER: &str = "Unlocked at level";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub name: String,
    pub value: String,
}

/// Maps a site label (or one of its synonyms) to a normalized effect name.
pub struct EffectRule {
    pattern: Regex,
    name: &'static str,
}

fn rule(pattern: &str, name: &'static str) -> EffectRule {
    EffectRule {
        pattern: Regex::new(pattern).expect("hardcoded regex pattern is valid"),
        name,
    }
}

/// Ordered rule table. Order matters: the first rule to claim a name wins.
static EFFECT_RULES: LazyLock<Vec<EffectRule>> = LazyLock::new(|| {
    vec![
        // Basic stats
        rule(r"Speed Bonus\s*(\d+)", "Speed Bonus"),
        rule(r"Stamina Bonus\s*(\d+)", "Stamina Bonus"),
        rule(r"Power Bonus\s*(\d+)", "Power Bonus"),
        rule(r"Guts Bonus\s*(\d+)", "Guts Bonus"),
        rule(r"Wisdom Bonus\s*(\d+)", "Wisdom Bonus"),
        rule(r"Wit Bonus\s*(\d+)", "Wisdom Bonus"),
        rule(r"Skill Pts Bonus\s*(\d+)", "Skill Pts Bonus"),
        // Initial stats
        rule(r"Initial Speed\s*(\d+)", "Initial Speed"),
        rule(r"Initial Stamina\s*(\d+)", "Initial Stamina"),
        rule(r"Initial Power\s*(\d+)", "Initial Power"),
        rule(r"Initial Guts\s*(\d+)", "Initial Guts"),
        rule(r"Initial Wisdom\s*(\d+)", "Initial Wisdom"),
        rule(r"Initial Wit\s*(\d+)", "Initial Wisdom"),
        // Percentage bonuses
        rule(r"Friendship Bonus\s*(\d+%?)", "Friendship Bonus"),
        rule(r"Mood Effect\s*(\d+%?)", "Mood Effect"),
        rule(r"Motivation Effect\s*(\d+%?)", "Motivation Effect"),
        rule(r"Training Effectiveness\s*(\d+%?)", "Training Effectiveness"),
        rule(r"Race Bonus\s*(\d+%?)", "Race Bonus"),
        rule(r"Fan Bonus\s*(\d+%?)", "Fan Bonus"),
        // Hints
        rule(r"Hint Rate\s*(\d+%?)", "Hint Rate"),
        rule(r"Hint Frequency\s*(\d+%?)", "Hint Rate"),
        rule(r"Hint Lv Up\s*(\d+%?)", "Hint Lv Up"),
        rule(r"Hint Levels\s*Lv\s*(\d+)", "Hint Lv Up"),
        // Bond and specialty
        rule(r"Starting Bond\s*(\d+)", "Starting Bond"),
        rule(r"Initial Friendship Gauge\s*(\d+)", "Starting Bond"),
        rule(r"Specialty Rate\s*(\d+%?)", "Specialty Rate"),
        rule(r"Specialty Priority\s*(\d+)", "Specialty Rate"),
        // Recovery and usage
        rule(r"Race Status\s*(\d+)", "Race Status"),
        rule(r"Energy Discount\s*(\d+%?)", "Energy Discount"),
        rule(r"Wit Friendship Recovery\s*(\d+)", "Wisdom Friendship Recovery"),
        // Catch-all
        rule(r"Unique Effect\s*(.*)", "Unique Effect"),
    ]
});

/// Line patterns tried against the whole page text when the effect panel yields nothing.
static FALLBACK_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(Friendship Bonus)\s*(\d+%?)$",
        r"^(Mood Effect)\s*(\d+%?)$",
        r"^(Race Bonus)\s*(\d+%?)$",
        r"^(Fan Bonus)\s*(\d+%?)$",
        r"^(Training Effectiveness)\s*(\d+%?)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("hardcoded regex pattern is valid"))
    .collect()
});

/// Effects shown on the page in its current level state.
pub fn extract_effects(snapshot: &Snapshot) -> Vec<Effect> {
    let effects = normalize_blocks(effect_blocks(snapshot.document()));
    if !effects.is_empty() {
        return effects;
    }

    let fallback = fallback_effects(snapshot.text());
    debug!(count = fallback.len(), "Effect panel empty, used page text fallback");
    fallback
}

/// Text of every unlocked effect block, one line per block.
pub fn effect_blocks(document: &Html) -> Vec<String> {
    document
        .select(&EFFECT_BLOCK)
        .map(element_text)
        .filter(|text| !text.contains(LOCKED_MARKER))
        .collect()
}

/// Runs the rule table over each block. A normalized name is accepted once.
pub fn normalize_blocks<I, S>(blocks: I) -> Vec<Effect>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut effects = Vec::new();

    for block in blocks {
        let block = block.as_ref();
        for rule in EFFECT_RULES.iter() {
            if seen.contains(rule.name) {
                continue;
            }
            let Some(value) = rule.pattern.captures(block).and_then(|caps| caps.get(1)) else {
                continue;
            };
            let value = value.as_str().trim();
            if value.is_empty() {
                continue;
            }
            seen.insert(rule.name);
            effects.push(Effect {
                name: rule.name.to_string(),
                value: value.to_string(),
            });
        }
    }

    effects
}

pub fn fallback_effects(text: &str) -> Vec<Effect> {
    let mut seen = HashSet::new();
    let mut effects = Vec::new();

    for line in text.lines().map(str::trim) {
        for pattern in FALLBACK_RULES.iter() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let name = &caps[1];
            if seen.insert(name.to_string()) {
                effects.push(Effect {
                    name: name.to_string(),
                    value: caps[2].to_string(),
                });
            }
        }
    }

    effects
}
