/// SurebetsFinder — Logger
/// JSONL event stream, NTFY alerts

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Jeden řádek JSON do `{log_dir}/{YYYY-MM-DD}.jsonl`
    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open journal {}", path.display()))?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct RawContentFetchedEvent {
    pub ts:       String,
    pub event:    &'static str,   // "RAW_CONTENT_FETCHED"
    pub provider: String,
    pub category: String,
    pub urls:     usize,
    pub bytes:    usize,
    pub ok:       bool,
    pub message:  String,
}

#[derive(Serialize, Debug)]
pub struct BetsImportedEvent {
    pub ts:      String,
    pub event:   &'static str,    // "BETS_IMPORTED"
    pub created: usize,
    pub updated: usize,
}

#[derive(Serialize, Debug)]
pub struct SureBetFoundEvent {
    pub ts:                  String,
    pub event:               &'static str,   // "SURE_BET_FOUND"
    pub sure_bet_id:         String,
    pub bets:                [String; 2],
    pub opponent_1:          String,
    pub opponent_2:          String,
    pub winning:             String,         // "opponent_1" | "opponent_2"
    pub odds_for_opponent_1: String,         // decimal jako string, bez f64
    pub odds_for_opponent_2: String,
    pub url_1:               String,
    pub url_2:               String,
    pub stake_1:             String,
    pub stake_2:             String,
    pub profit_1:            String,
    pub profit_2:            String,
    pub benefit_1:           String,
    pub benefit_2:           String,
}

/// Pošli čitelný push alert na ntfy.sh/{topic}
pub async fn send_ntfy_alert(topic: &str, msg: &str, title: &str) {
    let client = reqwest::Client::new();
    match client
        .post(format!("https://ntfy.sh/{topic}"))
        .header("Title", title)
        .header("Priority", "high")
        .header("Tags", "money_with_wings")
        .body(msg.to_string())
        .send()
        .await
    {
        Ok(_)  => tracing::info!("NTFY sent: {}", title),
        Err(e) => tracing::warn!("NTFY failed: {}", e),
    }
}
