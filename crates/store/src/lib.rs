pub mod model;

pub use model::{
    CardDetails, CardFilter, CardRecord, CardType, EffectSample, EventRecord, HintRecord, Rarity,
    StoredCard,
};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub const APP_VERSION_KEY: &str = "app_version";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Card {0} not found")]
    CardNotFound(i64),
}

/// Persistence the scraper writes through.
///
/// Detail rows for a card are always replaced as a whole so a re-scrape is idempotent.
pub trait CardStore {
    /// Inserts or updates the card keyed by its source URL and returns its identifier.
    fn upsert_card(&mut self, card: &CardRecord) -> Result<i64, StoreError>;

    fn card_id_by_url(&self, url: &str) -> Result<Option<i64>, StoreError>;

    fn set_image_path(&mut self, card_id: i64, path: &str) -> Result<(), StoreError>;

    /// Clears every effect, hint and event stored for the card and writes `details`
    /// in a single transaction.
    fn replace_details(&mut self, card_id: i64, details: &CardDetails) -> Result<(), StoreError>;
}

pub struct Database {
    conn: Connection,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS support_cards (
    card_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    rarity TEXT NOT NULL CHECK(rarity IN ('R', 'SR', 'SSR')),
    card_type TEXT NOT NULL,
    max_level INTEGER NOT NULL DEFAULT 50,
    source_url TEXT UNIQUE NOT NULL,
    image_path TEXT,
    scraped_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS support_effects (
    effect_id INTEGER PRIMARY KEY AUTOINCREMENT,
    card_id INTEGER NOT NULL,
    level INTEGER NOT NULL,
    effect_name TEXT NOT NULL,
    effect_value TEXT NOT NULL,
    FOREIGN KEY(card_id) REFERENCES support_cards(card_id) ON DELETE CASCADE
);

-- One sample per card, level and effect
CREATE UNIQUE INDEX IF NOT EXISTS idx_effects_card_level_name
    ON support_effects(card_id, level, effect_name);

CREATE TABLE IF NOT EXISTS support_hints (
    hint_id INTEGER PRIMARY KEY AUTOINCREMENT,
    card_id INTEGER NOT NULL,
    hint_name TEXT NOT NULL,
    hint_description TEXT NOT NULL DEFAULT '',
    FOREIGN KEY(card_id) REFERENCES support_cards(card_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS support_events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    card_id INTEGER NOT NULL,
    event_name TEXT NOT NULL,
    event_type TEXT NOT NULL,
    FOREIGN KEY(card_id) REFERENCES support_cards(card_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_hints_card ON support_hints(card_id);
CREATE INDEX IF NOT EXISTS idx_events_card ON support_events(card_id);
CREATE INDEX IF NOT EXISTS idx_cards_type ON support_cards(card_type);
CREATE INDEX IF NOT EXISTS idx_cards_rarity ON support_cards(rarity);
";

const CARD_COLUMNS: &str =
    "card_id, name, rarity, card_type, max_level, source_url, image_path, scraped_at";

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        info!("Opened card database at {:?}", path);
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Drops every table and recreates an empty schema.
    pub fn reset(&self) -> Result<(), StoreError> {
        info!("Resetting card database");
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS support_events;
            DROP TABLE IF EXISTS support_hints;
            DROP TABLE IF EXISTS support_effects;
            DROP TABLE IF EXISTS support_cards;
            DROP TABLE IF EXISTS meta;
            ",
        )?;
        self.init_schema()
    }

    // Meta
    pub fn meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    // Detail writers
    pub fn replace_effects(&mut self, card_id: i64, effects: &[EffectSample]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM support_effects WHERE card_id = ?1", params![card_id])?;
        for effect in effects {
            insert_effect(&tx, card_id, effect)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn append_hint(&self, card_id: i64, hint: &HintRecord) -> Result<i64, StoreError> {
        insert_hint(&self.conn, card_id, hint)
    }

    pub fn append_event(&self, card_id: i64, event: &EventRecord) -> Result<i64, StoreError> {
        insert_event(&self.conn, card_id, event)
    }

    // Queries
    pub fn card(&self, card_id: i64) -> Result<Option<StoredCard>, StoreError> {
        let card = self
            .conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM support_cards WHERE card_id = ?1"),
                params![card_id],
                stored_card_from_row,
            )
            .optional()?;
        Ok(card)
    }

    pub fn card_count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM support_cards", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn list_cards(&self, filter: &CardFilter) -> Result<Vec<StoredCard>, StoreError> {
        let mut sql = format!("SELECT {CARD_COLUMNS} FROM support_cards WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(rarity) = filter.rarity {
            args.push(rarity.as_str().to_string());
            sql.push_str(&format!(" AND rarity = ?{}", args.len()));
        }
        if let Some(card_type) = filter.card_type {
            args.push(card_type.as_str().to_string());
            sql.push_str(&format!(" AND card_type = ?{}", args.len()));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            args.push(format!("%{search}%"));
            sql.push_str(&format!(" AND name LIKE ?{}", args.len()));
        }
        sql.push_str(
            " ORDER BY CASE rarity WHEN 'SSR' THEN 1 WHEN 'SR' THEN 2 ELSE 3 END, name",
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), stored_card_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Effects for a card, at one level or at every scraped level.
    pub fn effects(&self, card_id: i64, level: Option<u32>) -> Result<Vec<EffectSample>, StoreError> {
        let map_row = |row: &Row<'_>| {
            Ok(EffectSample {
                level: row.get(0)?,
                name: row.get(1)?,
                value: row.get(2)?,
            })
        };

        let effects = match level {
            Some(level) => {
                let mut stmt = self.conn.prepare(
                    "SELECT level, effect_name, effect_value FROM support_effects
                     WHERE card_id = ?1 AND level = ?2 ORDER BY effect_name",
                )?;
                let rows = stmt
                    .query_map(params![card_id, level], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT level, effect_name, effect_value FROM support_effects
                     WHERE card_id = ?1 ORDER BY level, effect_name",
                )?;
                let rows = stmt
                    .query_map(params![card_id], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(effects)
    }

    pub fn hints(&self, card_id: i64) -> Result<Vec<HintRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT hint_name, hint_description FROM support_hints WHERE card_id = ?1 ORDER BY hint_id",
        )?;
        let hints = stmt
            .query_map(params![card_id], |row| {
                Ok(HintRecord {
                    name: row.get(0)?,
                    description: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hints)
    }

    pub fn events(&self, card_id: i64) -> Result<Vec<EventRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT event_name, event_type FROM support_events WHERE card_id = ?1 ORDER BY event_id",
        )?;
        let events = stmt
            .query_map(params![card_id], |row| {
                Ok(EventRecord {
                    name: row.get(0)?,
                    event_type: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }
}

impl CardStore for Database {
    fn upsert_card(&mut self, card: &CardRecord) -> Result<i64, StoreError> {
        let scraped_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO support_cards (name, rarity, card_type, max_level, source_url, image_path, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(source_url) DO UPDATE SET
                name = excluded.name,
                rarity = excluded.rarity,
                card_type = excluded.card_type,
                max_level = excluded.max_level,
                image_path = COALESCE(excluded.image_path, support_cards.image_path),
                scraped_at = excluded.scraped_at",
            params![
                &card.name,
                card.rarity.as_str(),
                card.card_type.as_str(),
                card.max_level,
                &card.source_url,
                &card.image_path,
                scraped_at,
            ],
        )?;

        let card_id = self
            .card_id_by_url(&card.source_url)?
            .ok_or(StoreError::Database(rusqlite::Error::QueryReturnedNoRows))?;
        debug!(card_id, url = %card.source_url, "Upserted card");
        Ok(card_id)
    }

    fn card_id_by_url(&self, url: &str) -> Result<Option<i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT card_id FROM support_cards WHERE source_url = ?1")?;
        let result = stmt.query_row(params![url], |row| row.get(0)).optional()?;
        Ok(result)
    }

    fn set_image_path(&mut self, card_id: i64, path: &str) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE support_cards SET image_path = ?1 WHERE card_id = ?2",
            params![path, card_id],
        )?;
        if updated == 0 {
            return Err(StoreError::CardNotFound(card_id));
        }
        Ok(())
    }

    fn replace_details(&mut self, card_id: i64, details: &CardDetails) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM support_effects WHERE card_id = ?1", params![card_id])?;
        tx.execute("DELETE FROM support_hints WHERE card_id = ?1", params![card_id])?;
        tx.execute("DELETE FROM support_events WHERE card_id = ?1", params![card_id])?;

        for effect in &details.effects {
            insert_effect(&tx, card_id, effect)?;
        }
        for hint in &details.hints {
            insert_hint(&tx, card_id, hint)?;
        }
        for event in &details.events {
            insert_event(&tx, card_id, event)?;
        }

        tx.commit()?;
        debug!(
            card_id,
            effects = details.effects.len(),
            hints = details.hints.len(),
            events = details.events.len(),
            "Replaced card details"
        );
        Ok(())
    }
}

fn insert_effect(conn: &Connection, card_id: i64, effect: &EffectSample) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO support_effects (card_id, level, effect_name, effect_value)
         VALUES (?1, ?2, ?3, ?4)",
        params![card_id, effect.level, &effect.name, &effect.value],
    )?;
    Ok(())
}

fn insert_hint(conn: &Connection, card_id: i64, hint: &HintRecord) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO support_hints (card_id, hint_name, hint_description) VALUES (?1, ?2, ?3)",
        params![card_id, &hint.name, &hint.description],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_event(conn: &Connection, card_id: i64, event: &EventRecord) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO support_events (card_id, event_name, event_type) VALUES (?1, ?2, ?3)",
        params![card_id, &event.name, &event.event_type],
    )?;
    Ok(conn.last_insert_rowid())
}

fn stored_card_from_row(row: &Row<'_>) -> rusqlite::Result<StoredCard> {
    let rarity: String = row.get(2)?;
    let card_type: String = row.get(3)?;
    Ok(StoredCard {
        id: row.get(0)?,
        name: row.get(1)?,
        rarity: rarity
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?,
        card_type: card_type
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?,
        max_level: row.get(4)?,
        source_url: row.get(5)?,
        image_path: row.get(6)?,
        scraped_at: row.get(7)?,
    })
}
