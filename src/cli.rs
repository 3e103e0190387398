use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use store::{CardType, Rarity};

#[derive(Parser, Debug)]
#[command(name = "support-cards")]
#[command(version)]
#[command(about = "Scrapes support card effects into a local database", long_about = None)]
pub struct Cli {
    /// What to do; scrapes the full listing when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// SQLite database file
    #[arg(long, global = true, env = "SUPPORT_CARDS_DB", default_value = "database/support_cards.db")]
    pub db: PathBuf,

    /// Directory card portraits are saved to
    #[arg(long, global = true, env = "SUPPORT_CARDS_IMAGES")]
    pub images: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scrape every card on the listing (default)
    Scrape(ScrapeArgs),

    /// List stored cards
    Cards {
        /// Only cards of this rarity (R, SR, SSR)
        #[arg(long)]
        rarity: Option<Rarity>,

        /// Only cards of this type (speed, stamina, power, guts, wisdom, friend, group)
        #[arg(long = "type")]
        card_type: Option<CardType>,

        /// Substring of the card name
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one card with its effects, hints and events
    Show {
        #[arg(value_name = "ID")]
        id: i64,

        /// Only effects sampled at this level
        #[arg(short, long)]
        level: Option<u32>,
    },

    /// Create the database schema
    Init {
        /// Drop all stored cards first
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScrapeArgs {
    /// JSON scrape configuration; unset fields keep their defaults
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Scrape at most this many cards
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The requested command, scraping with default arguments when none was given.
    pub fn selected_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Scrape(ScrapeArgs::default()))
    }
}
