use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("hardcoded selector is valid"));

static IMAGES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("hardcoded selector is valid"));

static INFOBOX_IMAGE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="infobox"] img"#).expect("hardcoded selector is valid")
});

static RARITY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\((?:SSR|SR|R)\)").expect("hardcoded regex pattern is valid")
});

const TITLE_NOISE: &str = "Support Card";

/// Identity fields read straight off an item page, before any table lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageInfo {
    /// Text of the first `h1`, empty when the page has none.
    pub title: String,
    pub rarity_src: Option<String>,
    pub type_src: Option<String>,
}

pub fn read_page_info(document: &Html) -> PageInfo {
    let title = document
        .select(&TITLE)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    PageInfo {
        title,
        rarity_src: image_src_containing(document, &["rarity"]),
        type_src: image_src_containing(document, &["obtain_0"]),
    }
}

fn image_src_containing(document: &Html, needles: &[&str]) -> Option<String> {
    document
        .select(&IMAGES)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| needles.iter().any(|needle| src.contains(needle)))
        .map(str::to_string)
}

/// Card name with rarity suffixes and the generic heading text removed.
/// `None` when nothing meaningful is left.
pub fn card_name(title: &str) -> Option<String> {
    let name = RARITY_SUFFIX_RE.replace_all(title, "");
    let name = name.replace(TITLE_NOISE, "");
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Absolute URL of the card's portrait image, if one can be identified.
///
/// Prefers an image served from a support or card path, then any large image on
/// the asset host, then the first image inside the info box.
pub fn portrait_url(
    document: &Html,
    page_url: &str,
    host_marker: &str,
    min_dimension: u32,
) -> Option<String> {
    let candidate = document
        .select(&IMAGES)
        .find(|img| is_card_art(*img, host_marker, min_dimension))
        .or_else(|| document.select(&INFOBOX_IMAGE).next())?;

    let src = candidate.value().attr("src")?;
    let base = Url::parse(page_url).ok()?;
    base.join(src).ok().map(String::from)
}

fn is_card_art(img: ElementRef<'_>, host_marker: &str, min_dimension: u32) -> bool {
    let Some(src) = img.value().attr("src") else {
        return false;
    };
    if src.contains("/supports/") || src.contains("/cards/") {
        return true;
    }

    let dimension = |name: &str| {
        img.value()
            .attr(name)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(0)
    };
    dimension("width") > min_dimension
        && dimension("height") > min_dimension
        && src.contains(host_marker)
}
