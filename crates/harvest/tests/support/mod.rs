// Simulated support card site for end-to-end scraper tests

#![allow(dead_code)]

use browser::{BrowserError, NavigationOptions, Page};
use harvest::{AssetError, AssetFetcher};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

pub const BASE_URL: &str = "https://fake.test";
pub const LISTING_URL: &str = "https://fake.test/umamusume/supports";

pub const RARITY_R: &str = "/images/umamusume/icons/utx_txt_rarity_01.png";
pub const RARITY_SR: &str = "/images/umamusume/icons/utx_txt_rarity_02.png";
pub const RARITY_SSR: &str = "/images/umamusume/icons/utx_txt_rarity_03.png";
pub const TYPE_SPEED: &str = "/images/umamusume/icons/utx_ico_obtain_00.png";
pub const TYPE_WISDOM: &str = "/images/umamusume/icons/utx_ico_obtain_04.png";

pub fn item_url(slug: &str) -> String {
    format!("{LISTING_URL}/{slug}")
}

/// A card page whose level readout and effect panel react to the +/- controls.
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub title: String,
    pub rarity_icon: String,
    pub type_icon: String,
    pub max_level: u32,
    pub start_level: u32,
    pub portrait: Option<String>,
    pub hints: Vec<String>,
    pub events: Vec<String>,
}

impl ItemPage {
    pub fn new(title: &str, rarity_icon: &str, type_icon: &str, max_level: u32) -> Self {
        Self {
            title: title.to_string(),
            rarity_icon: rarity_icon.to_string(),
            type_icon: type_icon.to_string(),
            max_level,
            start_level: 30.min(max_level),
            portrait: None,
            hints: vec!["Corner Recovery".to_string(), "Straightaway Adept".to_string()],
            events: vec!["Chance Encounter".to_string(), "A Festive Night Out".to_string()],
        }
    }

    pub fn with_portrait(mut self, src: &str) -> Self {
        self.portrait = Some(src.to_string());
        self
    }

    /// Friendship bonus shown at `level`.
    pub fn friendship_bonus(level: u32) -> String {
        format!("{}%", 10 + level / 5)
    }

    pub fn speed_bonus(level: u32) -> String {
        (1 + level / 25).to_string()
    }

    fn effect_rows(&self, level: u32) -> Vec<String> {
        let mut rows = vec![
            format!("Friendship Bonus {}", Self::friendship_bonus(level)),
            format!("Speed Bonus {}", Self::speed_bonus(level)),
        ];
        if level >= 45 {
            rows.push("Race Bonus 5%".to_string());
        } else {
            rows.push("Race Bonus 5% Unlocked at level 45".to_string());
        }
        rows
    }

    fn html(&self, level: u32) -> String {
        let portrait = self
            .portrait
            .as_ref()
            .map(|src| format!(r#"<img src="{src}">"#))
            .unwrap_or_default();
        let effects: String = self
            .effect_rows(level)
            .iter()
            .map(|row| format!(r#"<div class="effect__row"><span>{row}</span></div>"#))
            .collect();
        format!(
            r#"<html><body>
            <h1>{title}</h1>
            <img src="{rarity}"><img src="{card_type}">{portrait}
            <div class="stepper"><div>-5</div><div>-1</div><div>Level {level}</div><div>+1</div><div>+5</div></div>
            <div class="effects">{effects}</div>
            </body></html>"#,
            title = self.title,
            rarity = self.rarity_icon,
            card_type = self.type_icon,
        )
    }

    fn text(&self, level: u32) -> String {
        let mut lines = vec![self.title.clone(), format!("Level {level}")];
        lines.extend(self.effect_rows(level));
        lines.push("Support Hints".to_string());
        lines.extend(self.hints.iter().cloned());
        lines.push("Training Events".to_string());
        lines.extend(self.events.iter().cloned());
        lines.join("\n")
    }
}

enum SitePage {
    Listing(Vec<String>),
    Item(ItemPage),
}

/// A whole site served from memory through the [`Page`] trait.
pub struct FakeSite {
    pages: HashMap<String, SitePage>,
    failures: HashMap<String, u32>,
    current: RefCell<Option<String>>,
    level: Cell<u32>,
    navigations: RefCell<HashMap<String, u32>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failures: HashMap::new(),
            current: RefCell::new(None),
            level: Cell::new(1),
            navigations: RefCell::new(HashMap::new()),
        }
    }

    /// Serves a listing linking to every item added so far, in the given order.
    pub fn with_listing(mut self, slugs: &[&str]) -> Self {
        let hrefs = slugs
            .iter()
            .map(|slug| format!("/umamusume/supports/{slug}"))
            .collect();
        self.pages
            .insert(LISTING_URL.to_string(), SitePage::Listing(hrefs));
        self
    }

    pub fn with_item(mut self, slug: &str, item: ItemPage) -> Self {
        self.pages.insert(item_url(slug), SitePage::Item(item));
        self
    }

    /// The first `count` navigations to `slug` fail to load.
    pub fn failing(mut self, slug: &str, count: u32) -> Self {
        self.failures.insert(item_url(slug), count);
        self
    }

    pub fn navigations(&self, url: &str) -> u32 {
        self.navigations.borrow().get(url).copied().unwrap_or(0)
    }

    fn current_page(&self) -> Option<&SitePage> {
        let url = self.current.borrow().clone()?;
        self.pages.get(&url)
    }
}

impl Page for FakeSite {
    fn navigate(&self, url: &str, _options: &NavigationOptions) -> Result<(), BrowserError> {
        let count = {
            let mut navigations = self.navigations.borrow_mut();
            let count = navigations.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if count <= self.failures.get(url).copied().unwrap_or(0) {
            return Err(BrowserError::PageLoad {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }

        let Some(page) = self.pages.get(url) else {
            return Err(BrowserError::PageLoad {
                url: url.to_string(),
                reason: "404".to_string(),
            });
        };
        if let SitePage::Item(item) = page {
            self.level.set(item.start_level);
        }
        *self.current.borrow_mut() = Some(url.to_string());
        Ok(())
    }

    fn content(&self) -> Result<String, BrowserError> {
        Ok(match self.current_page() {
            Some(SitePage::Listing(hrefs)) => {
                let anchors: String = hrefs
                    .iter()
                    .map(|href| format!(r#"<a href="{href}">card</a>"#))
                    .collect();
                format!("<html><body><a href=\"/umamusume\">home</a>{anchors}</body></html>")
            }
            Some(SitePage::Item(item)) => item.html(self.level.get()),
            None => String::from("<html><body></body></html>"),
        })
    }

    fn inner_text(&self) -> Result<String, BrowserError> {
        Ok(match self.current_page() {
            Some(SitePage::Item(item)) => item.text(self.level.get()),
            _ => String::new(),
        })
    }

    fn click_leaf(&self, _tag: &str, text: &str) -> Result<bool, BrowserError> {
        let Some(SitePage::Item(item)) = self.current_page() else {
            return Ok(false);
        };
        let Ok(delta) = text.parse::<i64>() else {
            return Ok(false);
        };
        let next = (self.level.get() as i64 + delta).clamp(1, item.max_level as i64);
        self.level.set(next as u32);
        Ok(true)
    }

    fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    fn scroll_to_top(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    fn pause(&self, _duration: Duration) {}
}

/// Serves a fixed PNG header for every request, or fails every request.
pub struct StubFetcher {
    pub fail: bool,
    pub requests: RefCell<Vec<String>>,
}

impl StubFetcher {
    pub fn ok() -> Self {
        Self {
            fail: false,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }
}

impl AssetFetcher for StubFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        self.requests.borrow_mut().push(url.to_string());
        if self.fail {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
