use crate::{element_text, is_leaf};
use browser::{BrowserError, Page};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

static DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("hardcoded selector is valid"));

static LEVEL_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Level\s*(\d+)").expect("hardcoded regex pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StepperConfig {
    pub poll_interval_ms: u64,
    /// Polls after a click before the step counts as stalled.
    pub max_polls: u32,
    /// Wait after the last step so the effect panel can re-render.
    pub settle_ms: u64,
    /// Level assumed when no readout can be found on the page.
    pub fallback_level: u32,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            max_polls: 20,
            settle_ms: 200,
            fallback_level: 30,
        }
    }
}

/// One press of a level control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up5,
    Up1,
    Down5,
    Down1,
}

impl Step {
    /// Largest step toward `target` that cannot overshoot it.
    pub fn toward(current: u32, target: u32) -> Option<Step> {
        if current < target {
            Some(if target - current >= 5 { Step::Up5 } else { Step::Up1 })
        } else if current > target {
            Some(if current - target >= 5 { Step::Down5 } else { Step::Down1 })
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Up5 => "+5",
            Step::Up1 => "+1",
            Step::Down5 => "-5",
            Step::Down1 => "-1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    AtLevel(u32),
    Stepping { from: u32 },
    Stalled(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Clicked,
    ControlMissing,
    Readout(u32),
    /// The polling window closed without a readout change.
    NoChange,
}

impl StepperState {
    pub fn transition(self, observation: Observation) -> StepperState {
        use Observation::*;
        use StepperState::*;

        match (self, observation) {
            (AtLevel(level), Clicked) => Stepping { from: level },
            (AtLevel(level), ControlMissing) => Stalled(level),
            (AtLevel(_), Readout(level)) => AtLevel(level),
            (Stepping { from }, Readout(level)) if level != from => AtLevel(level),
            (Stepping { from }, NoChange) => Stalled(from),
            (state, _) => state,
        }
    }
}

/// Moves the page's level readout to a requested value by clicking its +/- controls.
pub struct LevelStepper<'a, P: Page + ?Sized> {
    page: &'a P,
    config: &'a StepperConfig,
}

impl<'a, P: Page + ?Sized> LevelStepper<'a, P> {
    pub fn new(page: &'a P, config: &'a StepperConfig) -> Self {
        Self { page, config }
    }

    /// Steps toward `target` and returns the level actually shown afterwards.
    ///
    /// Stops early when a control is missing or a click produces no change, so the
    /// result can differ from `target` at a rarity's level cap.
    pub fn set_level(&self, target: u32) -> Result<u32, BrowserError> {
        let mut state = StepperState::AtLevel(self.read_level()?);

        loop {
            state = match state {
                StepperState::AtLevel(current) => match Step::toward(current, target) {
                    None => break,
                    Some(step) => {
                        if self.page.click_leaf("div", step.label())? {
                            state.transition(Observation::Clicked)
                        } else {
                            debug!(current, control = step.label(), "Level control missing");
                            state.transition(Observation::ControlMissing)
                        }
                    }
                },
                StepperState::Stepping { .. } => self.await_readout(state)?,
                StepperState::Stalled(level) => {
                    debug!(level, target, "Level stepper stalled");
                    break;
                }
            };
        }

        self.page.pause(Duration::from_millis(self.config.settle_ms));
        let reached = self.read_level()?;
        if reached != target {
            debug!(target, reached, "Level target not reached");
        }
        Ok(reached)
    }

    fn await_readout(&self, mut state: StepperState) -> Result<StepperState, BrowserError> {
        for _ in 0..self.config.max_polls {
            self.page.pause(Duration::from_millis(self.config.poll_interval_ms));
            state = state.transition(Observation::Readout(self.read_level()?));
            if !matches!(state, StepperState::Stepping { .. }) {
                return Ok(state);
            }
        }
        Ok(state.transition(Observation::NoChange))
    }

    /// Current level from the readout, then from the page text, then the configured fallback.
    pub fn read_level(&self) -> Result<u32, BrowserError> {
        let html = self.page.content()?;
        if let Some(level) = readout_level(&Html::parse_document(&html)) {
            return Ok(level);
        }

        let text = self.page.inner_text()?;
        if let Some(level) = text_level(&text) {
            return Ok(level);
        }

        warn!(
            fallback = self.config.fallback_level,
            "No level readout found, assuming fallback level"
        );
        Ok(self.config.fallback_level)
    }
}

/// Level shown by the first childless `div` reading `Level <N>`.
pub fn readout_level(document: &Html) -> Option<u32> {
    document
        .select(&DIV_SELECTOR)
        .filter(|div| is_leaf(*div))
        .find_map(|div| {
            element_text(div)
                .strip_prefix("Level ")
                .and_then(|rest| rest.trim().parse().ok())
        })
}

pub fn text_level(text: &str) -> Option<u32> {
    LEVEL_TEXT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
