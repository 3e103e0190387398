// End-to-end tests for the card scraper against a simulated site

mod support;

use harvest::{
    run_batch, BatchObserver, BatchSummary, HarvestError, ItemOutcome, ItemReport, RecordBuilder,
    ScrapeConfig, ScrapedCard,
};
use store::{CardStore, CardType, Database, Rarity};
use support::{
    item_url, FakeSite, ItemPage, StubFetcher, BASE_URL, RARITY_R, RARITY_SR, RARITY_SSR,
    TYPE_SPEED, TYPE_WISDOM,
};
use tempfile::TempDir;

fn test_config(images: &TempDir) -> ScrapeConfig {
    ScrapeConfig {
        base_url: BASE_URL.to_string(),
        images_dir: images.path().join("images"),
        ..ScrapeConfig::default()
    }
}

fn special_week() -> ItemPage {
    ItemPage::new("Special Week (SSR) Support Card", RARITY_SSR, TYPE_SPEED, 50)
}

fn scrape(site: &FakeSite, db: &mut Database, config: &ScrapeConfig, slug: &str) -> ItemOutcome {
    let fetcher = StubFetcher::ok();
    let outcome = RecordBuilder::new(site, db, &fetcher, config).scrape_item(&item_url(slug));
    outcome
}

fn expect_scraped(outcome: ItemOutcome) -> (ScrapedCard, u32) {
    match outcome {
        ItemOutcome::Scraped { card, attempts } => (card, attempts),
        other => panic!("expected a scraped card, got {:?}", other),
    }
}

fn effect_value(db: &Database, card_id: i64, level: u32, name: &str) -> Option<String> {
    db.effects(card_id, Some(level))
        .unwrap()
        .into_iter()
        .find(|e| e.name == name)
        .map(|e| e.value)
}

#[derive(Default)]
struct RecordingObserver {
    total: Option<usize>,
    finished: Vec<(usize, String, bool)>,
}

impl BatchObserver for RecordingObserver {
    fn started(&mut self, total: usize) {
        self.total = Some(total);
    }

    fn item_finished(&mut self, report: &ItemReport<'_>) {
        self.finished
            .push((report.index, report.url.to_string(), report.outcome.is_success()));
    }
}

// ============================================================================
// Single Item Tests
// ============================================================================

#[test]
fn test_ssr_card_sampled_at_every_key_level() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_item("10001-special-week", special_week());
    let mut db = Database::open_in_memory().unwrap();

    let (card, attempts) = expect_scraped(scrape(&site, &mut db, &config, "10001-special-week"));
    assert_eq!(attempts, 1);
    assert_eq!(card.levels, vec![1, 25, 40, 50]);

    let stored = db.card(card.card_id).unwrap().unwrap();
    assert_eq!(stored.name, "Special Week");
    assert_eq!(stored.rarity, Rarity::SSR);
    assert_eq!(stored.card_type, CardType::Speed);
    assert_eq!(stored.max_level, 50);
    assert_eq!(stored.source_url, item_url("10001-special-week"));

    for level in [1, 25, 40, 50] {
        assert_eq!(
            effect_value(&db, card.card_id, level, "Friendship Bonus"),
            Some(ItemPage::friendship_bonus(level))
        );
        assert_eq!(
            effect_value(&db, card.card_id, level, "Speed Bonus"),
            Some(ItemPage::speed_bonus(level))
        );
    }
}

#[test]
fn test_locked_effects_only_recorded_once_unlocked() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_item("10001-special-week", special_week());
    let mut db = Database::open_in_memory().unwrap();

    let (card, _) = expect_scraped(scrape(&site, &mut db, &config, "10001-special-week"));

    assert_eq!(effect_value(&db, card.card_id, 40, "Race Bonus"), None);
    assert_eq!(
        effect_value(&db, card.card_id, 50, "Race Bonus"),
        Some("5%".to_string())
    );
}

#[test]
fn test_hints_and_events_are_stored() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_item("10001-special-week", special_week());
    let mut db = Database::open_in_memory().unwrap();

    let (card, _) = expect_scraped(scrape(&site, &mut db, &config, "10001-special-week"));

    let hints: Vec<_> = db
        .hints(card.card_id)
        .unwrap()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert_eq!(hints, vec!["Corner Recovery", "Straightaway Adept"]);

    let events = db.events(card.card_id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].name, "Chance Encounter");
    assert!(events.iter().all(|e| e.event_type == "Event"));
}

#[test]
fn test_lower_rarity_skips_unreachable_levels() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new()
        .with_item("20001-daring-tact", ItemPage::new("Daring Tact (R)", RARITY_R, TYPE_WISDOM, 40))
        .with_item("20002-super-creek", ItemPage::new("Super Creek (SR)", RARITY_SR, TYPE_WISDOM, 45));
    let mut db = Database::open_in_memory().unwrap();

    let (r_card, _) = expect_scraped(scrape(&site, &mut db, &config, "20001-daring-tact"));
    assert_eq!(r_card.record.rarity, Rarity::R);
    assert_eq!(r_card.record.card_type, CardType::Wisdom);
    assert_eq!(r_card.levels, vec![1, 25, 40]);
    assert!(db.effects(r_card.card_id, Some(50)).unwrap().is_empty());

    let (sr_card, _) = expect_scraped(scrape(&site, &mut db, &config, "20002-super-creek"));
    assert_eq!(sr_card.record.max_level, 45);
    assert_eq!(sr_card.levels, vec![1, 25, 40]);
}

#[test]
fn test_unknown_icons_use_defaults() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_item(
        "30001-mystery",
        ItemPage::new("Mystery Card", "/images/blank.png", "/images/blank.png", 40),
    );
    let mut db = Database::open_in_memory().unwrap();

    let (card, _) = expect_scraped(scrape(&site, &mut db, &config, "30001-mystery"));
    assert_eq!(card.record.rarity, Rarity::R);
    assert_eq!(card.record.card_type, CardType::Unknown);
    assert_eq!(card.record.max_level, 40);
}

#[test]
fn test_rescrape_keeps_card_id_and_replaces_details() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_item("10001-special-week", special_week());
    let mut db = Database::open_in_memory().unwrap();

    let (first, _) = expect_scraped(scrape(&site, &mut db, &config, "10001-special-week"));
    let first_effects = db.effects(first.card_id, None).unwrap().len();

    let (second, _) = expect_scraped(scrape(&site, &mut db, &config, "10001-special-week"));
    assert_eq!(second.card_id, first.card_id);
    assert_eq!(db.card_count().unwrap(), 1);
    assert_eq!(db.effects(second.card_id, None).unwrap().len(), first_effects);
    assert_eq!(db.hints(second.card_id).unwrap().len(), 2);
}

// ============================================================================
// Retry Tests
// ============================================================================

#[test]
fn test_transient_failures_are_retried() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new()
        .with_item("10001-special-week", special_week())
        .failing("10001-special-week", 2);
    let mut db = Database::open_in_memory().unwrap();

    let (card, attempts) = expect_scraped(scrape(&site, &mut db, &config, "10001-special-week"));
    assert_eq!(attempts, 3);
    assert_eq!(site.navigations(&item_url("10001-special-week")), 3);
    assert_eq!(card.levels, vec![1, 25, 40, 50]);
}

#[test]
fn test_gives_up_after_max_attempts() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new()
        .with_item("10001-special-week", special_week())
        .failing("10001-special-week", 10);
    let mut db = Database::open_in_memory().unwrap();

    let outcome = scrape(&site, &mut db, &config, "10001-special-week");
    assert!(matches!(outcome, ItemOutcome::Failed { attempts: 3, .. }));
    assert_eq!(site.navigations(&item_url("10001-special-week")), 3);
    assert_eq!(db.card_id_by_url(&item_url("10001-special-week")).unwrap(), None);
}

#[test]
fn test_degenerate_title_is_not_retried() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_item(
        "10002-placeholder",
        ItemPage::new("Support Card", RARITY_SSR, TYPE_SPEED, 50),
    );
    let mut db = Database::open_in_memory().unwrap();

    let outcome = scrape(&site, &mut db, &config, "10002-placeholder");
    assert!(matches!(outcome, ItemOutcome::Skipped { .. }));
    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts(), 1);
    assert_eq!(site.navigations(&item_url("10002-placeholder")), 1);
    assert_eq!(db.card_count().unwrap(), 0);
}

// ============================================================================
// Portrait Tests
// ============================================================================

#[test]
fn test_portrait_is_downloaded_and_recorded() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_item(
        "10001-special-week",
        special_week().with_portrait("/images/umamusume/supports/tex_support_card_10001.png"),
    );
    let mut db = Database::open_in_memory().unwrap();
    let fetcher = StubFetcher::ok();

    let outcome = RecordBuilder::new(&site, &mut db, &fetcher, &config)
        .scrape_item(&item_url("10001-special-week"));
    let (card, _) = expect_scraped(outcome);

    assert_eq!(
        fetcher.requests.borrow().as_slice(),
        ["https://fake.test/images/umamusume/supports/tex_support_card_10001.png".to_string()]
    );
    let expected = config
        .images_dir
        .join(format!("{}_Special Week.png", card.card_id));
    assert!(expected.exists());

    let stored = db.card(card.card_id).unwrap().unwrap();
    assert_eq!(stored.image_path, Some(expected.to_string_lossy().into_owned()));
    assert_eq!(card.record.image_path, stored.image_path);
}

#[test]
fn test_portrait_failure_does_not_fail_item() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_item(
        "10001-special-week",
        special_week().with_portrait("/images/umamusume/supports/tex_support_card_10001.png"),
    );
    let mut db = Database::open_in_memory().unwrap();
    let fetcher = StubFetcher::failing();

    let outcome = RecordBuilder::new(&site, &mut db, &fetcher, &config)
        .scrape_item(&item_url("10001-special-week"));
    let (card, attempts) = expect_scraped(outcome);

    assert_eq!(attempts, 1);
    assert_eq!(fetcher.requests.borrow().len(), 1);
    assert_eq!(db.card(card.card_id).unwrap().unwrap().image_path, None);
}

// ============================================================================
// Batch Tests
// ============================================================================

#[test]
fn test_batch_continues_past_failed_item() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new()
        .with_item("10001-special-week", special_week())
        .with_item(
            "10002-placeholder",
            ItemPage::new("Support Card", RARITY_SSR, TYPE_SPEED, 50),
        )
        .with_item(
            "10003-silence-suzuka",
            ItemPage::new("Silence Suzuka (SR)", RARITY_SR, TYPE_SPEED, 45),
        )
        .with_listing(&["10003-silence-suzuka", "10001-special-week", "10002-placeholder"]);
    let mut db = Database::open_in_memory().unwrap();
    let fetcher = StubFetcher::ok();
    let mut observer = RecordingObserver::default();

    let summary = run_batch(&site, &mut db, &fetcher, &config, &mut observer).unwrap();
    assert_eq!(
        summary,
        BatchSummary {
            total: 3,
            succeeded: 2,
            failed: 1,
        }
    );

    assert_eq!(observer.total, Some(3));
    assert_eq!(
        observer.finished,
        vec![
            (1, item_url("10001-special-week"), true),
            (2, item_url("10002-placeholder"), false),
            (3, item_url("10003-silence-suzuka"), true),
        ]
    );

    for slug in ["10001-special-week", "10003-silence-suzuka"] {
        let id = db.card_id_by_url(&item_url(slug)).unwrap().unwrap();
        assert!(!db.effects(id, None).unwrap().is_empty());
    }
    assert_eq!(db.card_id_by_url(&item_url("10002-placeholder")).unwrap(), None);
}

#[test]
fn test_batch_respects_item_limit() {
    let images = TempDir::new().unwrap();
    let config = ScrapeConfig {
        max_items: Some(1),
        ..test_config(&images)
    };
    let site = FakeSite::new()
        .with_item("10001-special-week", special_week())
        .with_item(
            "10003-silence-suzuka",
            ItemPage::new("Silence Suzuka (SR)", RARITY_SR, TYPE_SPEED, 45),
        )
        .with_listing(&["10001-special-week", "10003-silence-suzuka"]);
    let mut db = Database::open_in_memory().unwrap();

    let summary = run_batch(&site, &mut db, &StubFetcher::ok(), &config, &mut ()).unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(db.card_count().unwrap(), 1);
}

#[test]
fn test_empty_listing_is_an_error() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new().with_listing(&[]);
    let mut db = Database::open_in_memory().unwrap();

    let result = run_batch(&site, &mut db, &StubFetcher::ok(), &config, &mut ());
    assert!(matches!(result, Err(HarvestError::NoItems(_))));
    assert_eq!(db.card_count().unwrap(), 0);
}

#[test]
fn test_unreachable_listing_is_an_error() {
    let images = TempDir::new().unwrap();
    let config = test_config(&images);
    let site = FakeSite::new();
    let mut db = Database::open_in_memory().unwrap();

    let result = run_batch(&site, &mut db, &StubFetcher::ok(), &config, &mut ());
    assert!(matches!(result, Err(HarvestError::Navigator(_))));
}
