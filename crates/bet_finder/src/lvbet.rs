//! lvbet.pl — JSON feed zápasů (offer/matches API)

use bet_model::{normalize_name, Bet, Category, Provider};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

use crate::{de_decimal, json_records, snippet, BetFinder, FinderError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LvbetMatch {
    id:              LvbetId,
    date:            String,
    participants:    LvbetParticipants,
    primary_markets: Vec<LvbetMarket>,
    sports_groups:   Vec<LvbetSportsGroup>,
}

/// Feed posílá id jednou jako číslo, jindy jako string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LvbetId {
    Number(u64),
    Text(String),
}

impl fmt::Display for LvbetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LvbetId::Number(n) => write!(f, "{n}"),
            LvbetId::Text(s)   => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LvbetParticipants {
    home: String,
    away: String,
}

#[derive(Debug, Deserialize)]
struct LvbetMarket {
    selections: Vec<LvbetSelection>,
}

#[derive(Debug, Deserialize)]
struct LvbetSelection {
    name: String,
    rate: LvbetRate,
}

#[derive(Debug, Deserialize)]
struct LvbetRate {
    #[serde(deserialize_with = "de_decimal")]
    decimal: Decimal,
}

#[derive(Debug, Deserialize)]
struct LvbetSportsGroup {
    id:    LvbetId,
    label: String,
}

pub struct LvbetBetFinder;

impl LvbetBetFinder {
    fn parse_match(&self, item: Value, category: Category) -> Result<Bet, FinderError> {
        let record: LvbetMatch = serde_json::from_value(item).map_err(FinderError::MalformedRecord)?;

        // lvbet má hosty první — pořadí drží shodu s ostatními kancelářemi
        let opponent_1 = normalize_name(&record.participants.away);
        let opponent_2 = normalize_name(&record.participants.home);

        let market = record
            .primary_markets
            .first()
            .ok_or(FinderError::MissingElement("primaryMarkets"))?;
        let odds_1 = odds_for(&market.selections, &opponent_1)?;
        let odds_2 = odds_for(&market.selections, &opponent_2)?;

        let date = DateTime::parse_from_rfc3339(&record.date)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| FinderError::InvalidDate { value: record.date.clone(), reason: e.to_string() })?;

        let url = build_url(&record, &opponent_1, &opponent_2);

        Ok(Bet::new(opponent_1, opponent_2, odds_1, odds_2, category, Provider::Lvbet, date, url))
    }
}

impl BetFinder for LvbetBetFinder {
    fn provider(&self) -> Provider {
        Provider::Lvbet
    }

    fn find_bets(&self, content: &str, category: Category) -> Result<Vec<Bet>, FinderError> {
        info!("Finding bets for lvbet.pl");

        let mut bets = Vec::new();
        for item in json_records(content)? {
            let fragment = snippet(&item.to_string());
            match self.parse_match(item, category) {
                Ok(bet) => bets.push(bet),
                Err(e) => warn!("lvbet: can not fetch all information from `{}`: {}", fragment, e),
            }
        }

        info!(count = bets.len(), "lvbet bets found");
        Ok(bets)
    }
}

fn odds_for(selections: &[LvbetSelection], opponent: &str) -> Result<Decimal, FinderError> {
    selections
        .iter()
        .find(|s| normalize_name(&s.name) == opponent)
        .map(|s| s.rate.decimal)
        .ok_or_else(|| FinderError::SelectionNotFound(opponent.to_string()))
}

/// {label/label/...}/{o1-vs-o2}/--/{id/id/...}/{match id}
fn build_url(record: &LvbetMatch, opponent_1: &str, opponent_2: &str) -> String {
    let mut url_parts: Vec<String> = record.sports_groups.iter().map(|g| g.label.clone()).collect();
    let ids: Vec<String> = record.sports_groups.iter().map(|g| g.id.to_string()).collect();

    url_parts.push(format!(
        "{}-vs-{}",
        opponent_1.replace(' ', "-"),
        opponent_2.replace(' ', "-")
    ));

    format!("{}/--/{}/{}", url_parts.join("/"), ids.join("/"), record.id)
}
