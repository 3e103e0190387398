mod cli;
mod progress;
mod version;

use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use browser::Browser;
use harvest::{run_batch, BatchSummary, HttpFetcher, ScrapeConfig};
use store::{CardFilter, Database, StoreError, APP_VERSION_KEY};

use cli::{Cli, Commands, ScrapeArgs};
use progress::BatchProgress;
use version::compare_versions;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose, cli.quiet);

    match cli.selected_command() {
        Commands::Scrape(args) => run_scrape(&cli, args).await,
        Commands::Cards {
            rarity,
            card_type,
            search,
        } => list_cards(
            &cli.db,
            &CardFilter {
                rarity,
                card_type,
                search,
            },
        ),
        Commands::Show { id, level } => show_card(&cli.db, id, level),
        Commands::Init { reset } => init_database(&cli.db, reset),
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

async fn run_scrape(cli: &Cli, args: ScrapeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ScrapeConfig::load(path)?,
        None => ScrapeConfig::default(),
    };
    if let Some(images) = &cli.images {
        config.images_dir = images.clone();
    }
    if let Some(limit) = args.limit {
        config.max_items = Some(limit);
    }

    let mut db = open_database(&cli.db)?;
    db.set_meta(APP_VERSION_KEY, APP_VERSION)?;

    info!("Support card scraper {} starting", APP_VERSION);
    info!("Database: {:?}, images: {:?}", cli.db, config.images_dir);

    let headed = args.headed;
    let show_progress = !cli.quiet;

    // headless_chrome and reqwest::blocking both block; keep them off the async workers
    let summary = tokio::task::spawn_blocking(move || -> Result<BatchSummary> {
        let browser = if headed {
            Browser::new()?
        } else {
            Browser::new_headless()?
        };
        let page = browser.open_page()?;
        let fetcher = HttpFetcher::new(Duration::from_millis(config.asset.timeout_ms))?;

        let mut progress = BatchProgress::new(show_progress);
        let summary = run_batch(&page, &mut db, &fetcher, &config, &mut progress)?;
        progress.finish(&summary);
        Ok(summary)
    })
    .await
    .context("Scrape task panicked")??;

    info!(
        "Done: {} of {} cards scraped, {} failed",
        summary.succeeded, summary.total, summary.failed
    );
    Ok(())
}

fn open_database(path: &Path) -> Result<Database> {
    let db = Database::open(path).with_context(|| format!("Failed to open database {:?}", path))?;

    if let Some(written_by) = db.meta(APP_VERSION_KEY)? {
        if compare_versions(&written_by, APP_VERSION) == Ordering::Greater {
            warn!(
                "Database was last written by version {}, newer than this binary ({})",
                written_by, APP_VERSION
            );
        }
    }
    Ok(db)
}

fn init_database(path: &Path, reset: bool) -> Result<()> {
    let db = open_database(path)?;
    if reset {
        db.reset()?;
        info!("Database reset");
    }
    db.set_meta(APP_VERSION_KEY, APP_VERSION)?;
    info!("Database ready at {:?} ({} cards)", path, db.card_count()?);
    Ok(())
}

fn list_cards(path: &Path, filter: &CardFilter) -> Result<()> {
    let db = open_database(path)?;
    let cards = db.list_cards(filter)?;

    for card in &cards {
        println!(
            "{:>5}  {:<3}  {:<8}  Lv{:<2}  {}",
            card.id, card.rarity, card.card_type, card.max_level, card.name
        );
    }
    println!("{} cards", cards.len());
    Ok(())
}

fn show_card(path: &Path, id: i64, level: Option<u32>) -> Result<()> {
    let db = open_database(path)?;
    let card = db.card(id)?.ok_or(StoreError::CardNotFound(id))?;

    println!("{} ({}, {})", card.name, card.rarity, card.card_type);
    println!("  Max level: {}", card.max_level);
    println!("  Source:    {}", card.source_url);
    if let Some(image) = &card.image_path {
        println!("  Portrait:  {}", image);
    }
    println!("  Scraped:   {}", card.scraped_at);

    let effects = db.effects(id, level)?;
    let mut current_level = None;
    for effect in &effects {
        if current_level != Some(effect.level) {
            current_level = Some(effect.level);
            println!("\nLevel {}", effect.level);
        }
        println!("  {:<28} {}", effect.name, effect.value);
    }
    if effects.is_empty() {
        println!("\nNo effects recorded");
    }

    let hints = db.hints(id)?;
    if !hints.is_empty() {
        println!("\nSupport hints");
        for hint in &hints {
            println!("  {}", hint.name);
        }
    }

    let events = db.events(id)?;
    if !events.is_empty() {
        println!("\nTraining events");
        for event in &events {
            println!("  {}", event.name);
        }
    }
    Ok(())
}
