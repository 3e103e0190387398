use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HINTS_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Support [Hh]ints(.*?)(?:Training [Ee]vents|Skills from [Ee]vents|\z)")
        .expect("hardcoded regex pattern is valid")
});

static EVENTS_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Training [Ee]vents(.*)").expect("hardcoded regex pattern is valid")
});

/// Caps on how many heuristic matches are kept per section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionLimits {
    pub max_hints: usize,
    pub max_events: usize,
}

impl Default for SectionLimits {
    fn default() -> Self {
        Self {
            max_hints: 10,
            max_events: 15,
        }
    }
}

/// Skill names listed under the "Support Hints" heading.
pub fn hint_names(text: &str, limits: &SectionLimits) -> Vec<String> {
    let Some(section) = HINTS_SECTION_RE.captures(text).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };

    section
        .as_str()
        .lines()
        .map(str::trim)
        .filter(|line| {
            let len = line.chars().count();
            len > 3
                && len < 60
                && !line.contains("Lv")
                && !line.contains('%')
                && !line.contains("Details")
                && starts_capitalized(line)
        })
        .take(limits.max_hints)
        .map(str::to_string)
        .collect()
}

/// Event titles listed under the "Training Events" heading.
pub fn event_names(text: &str, limits: &SectionLimits) -> Vec<String> {
    let Some(section) = EVENTS_SECTION_RE.captures(text).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };

    section
        .as_str()
        .lines()
        .map(str::trim)
        .filter(|line| {
            let len = line.chars().count();
            len > 5
                && len < 80
                && !line.contains('%')
                && !line.contains("Energy")
                && !line.contains("bond")
                && !line.contains('+')
                && starts_capitalized(line)
        })
        .take(limits.max_events)
        .map(str::to_string)
        .collect()
}

fn starts_capitalized(line: &str) -> bool {
    line.chars().next().is_some_and(|c| !c.is_lowercase())
}
