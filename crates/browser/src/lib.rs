use headless_chrome::Browser as ChromeBrowser;
use headless_chrome::{LaunchOptions, Tab};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),
    #[error("Page failed to load {url}: {reason}")]
    PageLoad { url: String, reason: String },
    #[error("Script error: {0}")]
    Script(String),
    #[error("Timeout error: {0}")]
    Timeout(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    pub timeout_ms: u64,
    pub wait_for_idle: bool,
    /// Extra delay after load so client-side hydration can finish.
    pub settle_ms: u64,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 60000,
            wait_for_idle: true,
            settle_ms: 2000,
        }
    }
}

/// A single rendered page that can be navigated, read and clicked.
///
/// All scraping logic is written against this trait so it can run against a
/// live Chrome tab or a simulated page.
pub trait Page {
    fn navigate(&self, url: &str, options: &NavigationOptions) -> Result<(), BrowserError>;

    /// Serialized DOM of the current document.
    fn content(&self) -> Result<String, BrowserError>;

    /// Visible text of the body, one rendered line per line.
    fn inner_text(&self) -> Result<String, BrowserError>;

    /// Clicks the first childless `tag` element whose trimmed text equals `text`.
    /// Returns `false` when no such element exists.
    fn click_leaf(&self, tag: &str, text: &str) -> Result<bool, BrowserError>;

    fn scroll_to_bottom(&self) -> Result<(), BrowserError>;

    fn scroll_to_top(&self) -> Result<(), BrowserError>;

    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct Browser {
    browser: ChromeBrowser,
}

impl Browser {
    pub fn new() -> Result<Self, BrowserError> {
        Self::launch(false)
    }

    pub fn new_headless() -> Result<Self, BrowserError> {
        Self::launch(true)
    }

    fn launch(headless: bool) -> Result<Self, BrowserError> {
        let launch_options = LaunchOptions::default_builder()
            .headless(headless)
            .window_size(Some((1920, 1080)))
            .idle_browser_timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let browser = ChromeBrowser::new(launch_options)
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!(headless, "Browser launched successfully");
        Ok(Self { browser })
    }

    pub fn open_page(&self) -> Result<ChromePage, BrowserError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
        Ok(ChromePage { tab })
    }
}

pub struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    fn evaluate(&self, script: &str, await_promise: bool) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .tab
            .evaluate(script, await_promise)
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }
}

impl Page for ChromePage {
    fn navigate(&self, url: &str, options: &NavigationOptions) -> Result<(), BrowserError> {
        info!("Navigating to: {}", url);

        let page_load = |e: anyhow::Error| BrowserError::PageLoad {
            url: url.to_string(),
            reason: e.to_string(),
        };

        self.tab
            .set_default_timeout(Duration::from_millis(options.timeout_ms));
        self.tab.navigate_to(url).map_err(page_load)?;

        if options.wait_for_idle {
            self.tab.wait_until_navigated().map_err(page_load)?;
        }

        std::thread::sleep(Duration::from_millis(options.settle_ms));

        debug!("Navigation complete");
        Ok(())
    }

    fn content(&self) -> Result<String, BrowserError> {
        self.tab
            .get_content()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    fn inner_text(&self) -> Result<String, BrowserError> {
        match self.evaluate("document.body ? document.body.innerText : ''", false)? {
            serde_json::Value::String(text) => Ok(text),
            _ => Ok(String::new()),
        }
    }

    fn click_leaf(&self, tag: &str, text: &str) -> Result<bool, BrowserError> {
        let tag = serde_json::to_string(tag).map_err(|e| BrowserError::Script(e.to_string()))?;
        let text = serde_json::to_string(text).map_err(|e| BrowserError::Script(e.to_string()))?;
        let script = format!(
            r#"(() => {{
                const el = Array.from(document.querySelectorAll({tag}))
                    .find(d => d.children.length === 0 && d.textContent.trim() === {text});
                if (!el) return false;
                el.click();
                return true;
            }})()"#
        );
        Ok(self.evaluate(&script, false)? == serde_json::Value::Bool(true))
    }

    fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)?;
        Ok(())
    }

    fn scroll_to_top(&self) -> Result<(), BrowserError> {
        self.evaluate("window.scrollTo(0, 0);", false)?;
        Ok(())
    }
}
