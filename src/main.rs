/// SurebetsFinder — CLI
///
/// Co dělá:
///   1. import-raw-content  stáhne výpisy zápasů (efortuna, betclick, lvbet) do DB
///   2. import-bets         normalizuje nezpracované payloady na bety (upsert)
///   3. find-surebets       páruje budoucí bety a hledá garantovaný zisk
///   run = všechny tři kroky za sebou
///
/// Co NEDĚLÁ: žádné sázky, jen log + journal + volitelně ntfy alert
///
/// Spuštění:
///   cargo run --bin surebets-finder -- run

mod bet_db;
mod config;
mod raw_content;

use anyhow::Result;
use arb_detector::{JournalSink, SureBetSink, SureBetsFinder};
use bet_db::{SqliteBetStore, SqliteRawContentStore, SqliteSureBetStore};
use bet_importer::BetImporter;
use bet_model::SureBet;
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::AppConfig;
use dotenv::dotenv;
use logger::{now_iso, send_ntfy_alert, BetsImportedEvent, EventLogger};
use raw_content::{import_raw_contents, WebClient};
use rusqlite::Connection;
use std::env;
use std::fs::File;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "surebets-finder")]
#[command(about = "Finds cross-bookmaker sure bets on esport markets")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite file (default data/surebets.db)
    #[arg(long, global = true, env = "SUREBETS_DB_PATH")]
    db: Option<String>,

    /// JSONL journal dir (default logs)
    #[arg(long, global = true, env = "SUREBETS_LOG_DIR")]
    log_dir: Option<String>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Fetch raw payloads from all providers
    ImportRawContent,
    /// Normalize unprocessed payloads into bets
    ImportBets,
    /// Detect sure bets among future bets
    FindSurebets,
    /// All three steps in order
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = AppConfig::from_env();
    if let Some(db) = cli.db {
        cfg.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        cfg.log_dir = log_dir;
    }

    info!("=== SurebetsFinder ===");
    info!("DB: {} | Logs: {} | Stake: {}", cfg.db_path, cfg.log_dir, cfg.total_stake);

    // Single instance lock — import a detekce nesmí běžet nad DB souběžně
    let lock_file_path = env::temp_dir().join("surebets_finder.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of surebets-finder is already running! Exiting.");
            return Ok(());
        }
    };

    let conn = bet_db::open(&cfg.db_path)?;
    let journal = EventLogger::new(&cfg.log_dir);

    match cli.command {
        Command::ImportRawContent => import_raw_content(&conn, &journal, &cfg).await?,
        Command::ImportBets => import_bets(&conn, &journal)?,
        Command::FindSurebets => find_surebets(&conn, &cfg).await?,
        Command::Run => {
            import_raw_content(&conn, &journal, &cfg).await?;
            import_bets(&conn, &journal)?;
            find_surebets(&conn, &cfg).await?;
        }
    }

    Ok(())
}

async fn import_raw_content(conn: &Connection, journal: &EventLogger, cfg: &AppConfig) -> Result<()> {
    let client = WebClient::new(cfg.fetch_timeout)?;
    let mut store = SqliteRawContentStore::new(conn);
    import_raw_contents(&client, &mut store, journal).await?;
    Ok(())
}

fn import_bets(conn: &Connection, journal: &EventLogger) -> Result<()> {
    let mut bets = SqliteBetStore::new(conn);
    let mut source = SqliteRawContentStore::new(conn);

    let result = BetImporter::new(&mut bets).import_all(&mut source)?;

    let ev = BetsImportedEvent {
        ts:      now_iso(),
        event:   "BETS_IMPORTED",
        created: result.created,
        updated: result.updated,
    };
    if let Err(e) = journal.log(&ev) {
        warn!("journal write failed: {}", e);
    }
    Ok(())
}

async fn find_surebets(conn: &Connection, cfg: &AppConfig) -> Result<()> {
    let bets = SqliteBetStore::new(conn);
    let mut journal = JournalSink::new(&cfg.log_dir);
    let mut db_sink = SqliteSureBetStore::new(conn);

    let finder = SureBetsFinder::new(cfg.total_stake);
    let sure_bets = {
        let mut sinks = SinkChain { sinks: vec![&mut journal as &mut dyn SureBetSink, &mut db_sink] };
        finder.find_and_report(&bets, &mut sinks, Utc::now())?
    };

    // alert jen na nálezy, které v DB ještě nebyly
    let fresh = db_sink.fresh();
    if let Some(topic) = &cfg.ntfy_topic {
        for sure_bet in fresh {
            let title = format!(
                "Sure bet {} vs {} ({})",
                sure_bet.opponent_1(),
                sure_bet.opponent_2(),
                sure_bet.calculation_result().benefit_1
            );
            send_ntfy_alert(topic, &sure_bet.info(), &title).await;
        }
    }

    info!(count = sure_bets.len(), new = fresh.len(), "Sure bets finder finished");
    Ok(())
}

/// Každý nález projde všemi sinky v pořadí
struct SinkChain<'a> {
    sinks: Vec<&'a mut dyn SureBetSink>,
}

impl SureBetSink for SinkChain<'_> {
    fn emit(&mut self, sure_bet: &SureBet) -> Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.emit(sure_bet)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bet_model::{Bet, Category, Provider};
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "surebets-finder",
            "find-surebets",
            "--db",
            "/tmp/sb.db",
            "--log-dir",
            "/tmp/journal",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::FindSurebets));
        assert_eq!(cli.db.as_deref(), Some("/tmp/sb.db"));
        assert_eq!(cli.log_dir.as_deref(), Some("/tmp/journal"));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["surebets-finder", "place-bets"]).is_err());
    }

    #[test]
    fn sink_chain_feeds_every_sink() {
        let date = Utc::now() + chrono::Duration::days(1);
        let pair = [
            Bet::new("ence", "faze", dec!(2.10), dec!(1.80), Category::Esport, Provider::Efortuna, date, "/ence-faze"),
            Bet::new("ence", "faze", dec!(1.90), dec!(2.05), Category::Esport, Provider::Betclick, date, "/ence-faze"),
        ];
        let found = SureBetsFinder::default().find(&pair).unwrap();

        let mut first: Vec<SureBet> = Vec::new();
        let mut second: Vec<SureBet> = Vec::new();
        let mut chain = SinkChain { sinks: vec![&mut first as &mut dyn SureBetSink, &mut second] };
        for sure_bet in &found {
            chain.emit(sure_bet).unwrap();
        }
        drop(chain);

        assert_eq!(first.len(), found.len());
        assert_eq!(second.len(), found.len());
    }
}
