//! Reads the rendered state of a support card page: the level readout, the
//! effect panel and the free-text hint and event sections.

pub mod effects;
pub mod level;
pub mod sections;

pub use effects::{extract_effects, Effect};
pub use level::{LevelStepper, Observation, Step, StepperConfig, StepperState};
pub use sections::{event_names, hint_names, SectionLimits};

use browser::{BrowserError, Page};
use scraper::{ElementRef, Html};

/// A point-in-time copy of a rendered page.
pub struct Snapshot {
    document: Html,
    text: String,
}

impl Snapshot {
    pub fn capture<P: Page + ?Sized>(page: &P) -> Result<Self, BrowserError> {
        let html = page.content()?;
        let text = page.inner_text()?;
        Ok(Self::from_parts(&html, &text))
    }

    pub fn from_parts(html: &str, text: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            text: text.to_string(),
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Visible text of the page body.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Text of an element with all whitespace runs collapsed to single spaces.
///
/// Adjacent text nodes are joined as rendered; only element boundaries add a
/// separator, so `25<!-- -->%` reads as `25%`.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    push_text(element, &mut text);
    collapse_whitespace(&text)
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            out.push(' ');
            push_text(child, out);
            out.push(' ');
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the element has no element children.
pub fn is_leaf(element: ElementRef<'_>) -> bool {
    !element.children().any(|child| child.value().is_element())
}
