//! SQLite úložiště — bety, raw contenty a nalezené sure bety
//!
//! Všechny tři store typy si půjčují jedno `Connection`; rusqlite bere
//! `&self`, takže importer může držet bet store i raw content zdroj zároveň.

use anyhow::{Context, Result};
use arb_detector::{winning_label, SureBetSink};
use bet_model::{
    round_money, Bet, BetLookup, BetStore, Category, Provider, RawContent, RawContentSource,
    StoreError, SureBet,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

pub fn open(path: &str) -> Result<Connection> {
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let conn = Connection::open(db_path).with_context(|| format!("open sqlite db at {path}"))?;
    conn.pragma_update(None, "journal_mode", "WAL").ok();
    conn.pragma_update(None, "synchronous", "NORMAL").ok();
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS bet (
            id TEXT PRIMARY KEY,
            opponent_1 TEXT NOT NULL,
            opponent_2 TEXT NOT NULL,
            odds_1 TEXT NOT NULL,
            odds_2 TEXT NOT NULL,
            category TEXT NOT NULL,
            provider TEXT NOT NULL,
            date TEXT NOT NULL,
            url TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_bet_identity ON bet(opponent_1, opponent_2, date, provider);
        CREATE INDEX IF NOT EXISTS idx_bet_date ON bet(date);

        CREATE TABLE IF NOT EXISTS raw_content (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            category TEXT NOT NULL,
            provider TEXT NOT NULL,
            was_processed INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_raw_content_pending ON raw_content(was_processed);

        CREATE TABLE IF NOT EXISTS sure_bet (
            id TEXT PRIMARY KEY,
            bet_1_id TEXT NOT NULL,
            bet_2_id TEXT NOT NULL,
            opponent_1 TEXT NOT NULL,
            opponent_2 TEXT NOT NULL,
            winning TEXT NOT NULL,
            odds_for_opponent_1 TEXT NOT NULL,
            odds_for_opponent_2 TEXT NOT NULL,
            url_1 TEXT NOT NULL,
            url_2 TEXT NOT NULL,
            stake_1 TEXT NOT NULL,
            stake_2 TEXT NOT NULL,
            profit_1 TEXT NOT NULL,
            profit_2 TEXT NOT NULL,
            benefit_1 TEXT NOT NULL,
            benefit_2 TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sure_bet_pair ON sure_bet(bet_1_id, bet_2_id, winning);
        CREATE INDEX IF NOT EXISTS idx_sure_bet_created ON sure_bet(created_at);
        "#,
    )
    .context("init schema")?;
    Ok(())
}

/// `...Z`, sekundová přesnost — lexikální pořadí = časové
fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn money(value: Decimal) -> String {
    round_money(value).to_string()
}

/// TEXT sloupec → typ; chyba parsování je chyba konverze sloupce
fn text_column<T, E>(row: &Row<'_>, idx: usize, parse: impl FnOnce(&str) -> Result<T, E>) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|d| d.with_timezone(&Utc))
}

// ── Bet ──────────────────────────────────────────────────────────────────────

const BET_COLUMNS: &str =
    "id, opponent_1, opponent_2, odds_1, odds_2, category, provider, date, url, updated_at, created_at";

fn bet_from_row(row: &Row<'_>) -> rusqlite::Result<Bet> {
    Ok(Bet {
        id:         text_column(row, 0, Uuid::parse_str)?,
        opponent_1: row.get(1)?,
        opponent_2: row.get(2)?,
        odds_1:     text_column(row, 3, Decimal::from_str)?,
        odds_2:     text_column(row, 4, Decimal::from_str)?,
        category:   text_column(row, 5, Category::from_str)?,
        provider:   text_column(row, 6, Provider::from_str)?,
        date:       text_column(row, 7, parse_ts)?,
        url:        row.get(8)?,
        updated_at: text_column(row, 9, parse_ts)?,
        created_at: text_column(row, 10, parse_ts)?,
    })
}

pub struct SqliteBetStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteBetStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl BetStore for SqliteBetStore<'_> {
    fn create(&mut self, bet: &Bet) -> Result<(), StoreError> {
        self.conn
            .execute(
                &format!("INSERT INTO bet({BET_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
                params![
                    bet.id.to_string(),
                    bet.opponent_1,
                    bet.opponent_2,
                    money(bet.odds_1),
                    money(bet.odds_2),
                    bet.category.as_str(),
                    bet.provider.as_str(),
                    ts(bet.date),
                    bet.url,
                    ts(bet.updated_at),
                    ts(bet.created_at),
                ],
            )
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn save(&mut self, bet: &Bet) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                r#"
                UPDATE bet SET
                    opponent_1=?2,
                    opponent_2=?3,
                    odds_1=?4,
                    odds_2=?5,
                    category=?6,
                    provider=?7,
                    date=?8,
                    url=?9,
                    updated_at=?10
                WHERE id=?1
                "#,
                params![
                    bet.id.to_string(),
                    bet.opponent_1,
                    bet.opponent_2,
                    money(bet.odds_1),
                    money(bet.odds_2),
                    bet.category.as_str(),
                    bet.provider.as_str(),
                    ts(bet.date),
                    bet.url,
                    ts(bet.updated_at),
                ],
            )
            .map_err(StoreError::backend)?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("bet id={}", bet.id)));
        }
        Ok(())
    }

    fn find_one(&self, lookup: &BetLookup) -> Result<Bet, StoreError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {BET_COLUMNS} FROM bet \
                     WHERE opponent_1=?1 AND opponent_2=?2 AND date=?3 AND provider=?4"
                ),
                params![lookup.opponent_1, lookup.opponent_2, ts(lookup.date), lookup.provider.as_str()],
                bet_from_row,
            )
            .optional()
            .map_err(StoreError::backend)?
            .ok_or_else(|| StoreError::NotFound(lookup.to_string()))
    }

    fn get_all_future(&self, now: DateTime<Utc>) -> Result<Vec<Bet>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BET_COLUMNS} FROM bet WHERE date >= ?1 ORDER BY date, provider"))
            .map_err(StoreError::backend)?;
        let rows = stmt
            .query_map(params![ts(now)], bet_from_row)
            .map_err(StoreError::backend)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::backend)
    }
}

// ── RawContent ───────────────────────────────────────────────────────────────

pub struct SqliteRawContentStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRawContentStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, raw: &RawContent) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO raw_content(id, content, category, provider, was_processed, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    raw.id.to_string(),
                    raw.content,
                    raw.category.as_str(),
                    raw.provider.as_str(),
                    if raw.was_processed { 1 } else { 0 },
                    raw.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| format!("insert raw content {}", raw.id))?;
        Ok(())
    }
}

fn raw_content_from_row(row: &Row<'_>) -> rusqlite::Result<RawContent> {
    let was_processed: i64 = row.get(4)?;
    Ok(RawContent {
        id:         text_column(row, 0, Uuid::parse_str)?,
        content:    row.get(1)?,
        category:   text_column(row, 2, Category::from_str)?,
        provider:   text_column(row, 3, Provider::from_str)?,
        was_processed: was_processed != 0,
        created_at: text_column(row, 5, parse_ts)?,
    })
}

impl RawContentSource for SqliteRawContentStore<'_> {
    fn get_all_unprocessed(&self) -> Result<Vec<RawContent>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, content, category, provider, was_processed, created_at \
                 FROM raw_content WHERE was_processed=0 ORDER BY created_at",
            )
            .map_err(StoreError::backend)?;
        let rows = stmt.query_map([], raw_content_from_row).map_err(StoreError::backend)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::backend)
    }

    fn mark_processed(&mut self, id: Uuid) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("UPDATE raw_content SET was_processed=1 WHERE id=?1", params![id.to_string()])
            .map_err(StoreError::backend)?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("raw_content id={id}")));
        }
        Ok(())
    }
}

// ── SureBet ──────────────────────────────────────────────────────────────────

pub struct SqliteSureBetStore<'c> {
    conn:  &'c Connection,
    fresh: Vec<SureBet>,
}

impl<'c> SqliteSureBetStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn, fresh: Vec::new() }
    }

    /// Nálezy, které v DB dosud nebyly (jen ty se alertují)
    pub fn fresh(&self) -> &[SureBet] {
        &self.fresh
    }
}

impl SureBetSink for SqliteSureBetStore<'_> {
    /// Upsert podle (bet_1_id, bet_2_id, winning); opakovaný nález jen
    /// přepíše kurzy a stake, id a created_at zůstávají z prvního běhu
    fn emit(&mut self, sure_bet: &SureBet) -> Result<()> {
        let calc = sure_bet.calculation_result();
        let [bet_1, bet_2] = sure_bet.bets();
        let id = sure_bet.id().to_string();

        let stored_id: String = self
            .conn
            .query_row(
                r#"
                INSERT INTO sure_bet(id, bet_1_id, bet_2_id, opponent_1, opponent_2, winning,
                    odds_for_opponent_1, odds_for_opponent_2, url_1, url_2,
                    stake_1, stake_2, profit_1, profit_2, benefit_1, benefit_2, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
                ON CONFLICT(bet_1_id, bet_2_id, winning) DO UPDATE SET
                    odds_for_opponent_1=excluded.odds_for_opponent_1,
                    odds_for_opponent_2=excluded.odds_for_opponent_2,
                    url_1=excluded.url_1,
                    url_2=excluded.url_2,
                    stake_1=excluded.stake_1,
                    stake_2=excluded.stake_2,
                    profit_1=excluded.profit_1,
                    profit_2=excluded.profit_2,
                    benefit_1=excluded.benefit_1,
                    benefit_2=excluded.benefit_2
                RETURNING id
                "#,
                params![
                    id,
                    bet_1.to_string(),
                    bet_2.to_string(),
                    sure_bet.opponent_1(),
                    sure_bet.opponent_2(),
                    winning_label(sure_bet.winning()),
                    money(sure_bet.odds_for_opponent_1()),
                    money(sure_bet.odds_for_opponent_2()),
                    sure_bet.url_1(),
                    sure_bet.url_2(),
                    money(calc.stake_1),
                    money(calc.stake_2),
                    money(calc.profit_1),
                    money(calc.profit_2),
                    calc.benefit_1,
                    calc.benefit_2,
                    ts(sure_bet.created_at()),
                ],
                |r| r.get(0),
            )
            .with_context(|| format!("upsert sure bet {}", sure_bet.id()))?;

        if stored_id == id {
            self.fresh.push(sure_bet.clone());
        }
        Ok(())
    }
}
