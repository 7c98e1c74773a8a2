//! betclic.pl — JSON feed událostí (offer API)
//!
//! Bereme jen události s neprázdným `markets`. Kurz soupeře se hledá podle
//! jména selekce == zkratka soupeře, ne podle pozice v poli.

use bet_model::{normalize_name, Bet, Category, Provider};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{de_decimal, json_records, snippet, BetFinder, FinderError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BetclickEvent {
    date:                 String,
    relative_desktop_url: String,
    competition:          BetclickCompetition,
    contestants:          Vec<BetclickContestant>,
    markets:              Vec<BetclickMarket>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BetclickCompetition {
    relative_desktop_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BetclickContestant {
    name:       String,
    short_name: Option<String>,
}

impl BetclickContestant {
    /// Kód, pod kterým je soupeř v selekcích
    fn code(&self) -> &str {
        self.short_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct BetclickMarket {
    selections: Vec<BetclickSelection>,
}

#[derive(Debug, Deserialize)]
struct BetclickSelection {
    name: String,
    #[serde(deserialize_with = "de_decimal")]
    odds: Decimal,
}

pub struct BetclickBetFinder;

impl BetclickBetFinder {
    fn parse_event(&self, item: Value, category: Category) -> Result<Bet, FinderError> {
        let event: BetclickEvent = serde_json::from_value(item).map_err(FinderError::MalformedRecord)?;

        let [contestant_1, contestant_2, ..] = event.contestants.as_slice() else {
            return Err(FinderError::MissingElement("contestants"));
        };
        let market = event.markets.first().ok_or(FinderError::MissingElement("markets"))?;

        let odds_1 = odds_for(&market.selections, contestant_1.code())?;
        let odds_2 = odds_for(&market.selections, contestant_2.code())?;
        let date = parse_date(&event.date)?;
        let url = format!(
            "{}/{}",
            event.competition.relative_desktop_url, event.relative_desktop_url
        );

        Ok(Bet::new(
            normalize_name(&contestant_1.name),
            normalize_name(&contestant_2.name),
            odds_1,
            odds_2,
            category,
            Provider::Betclick,
            date,
            url,
        ))
    }
}

impl BetFinder for BetclickBetFinder {
    fn provider(&self) -> Provider {
        Provider::Betclick
    }

    fn find_bets(&self, content: &str, category: Category) -> Result<Vec<Bet>, FinderError> {
        info!("Finding bets for betclic.pl");

        let mut bets = Vec::new();
        for item in json_records(content)? {
            let has_markets = item
                .get("markets")
                .and_then(Value::as_array)
                .is_some_and(|m| !m.is_empty());
            if !has_markets {
                debug!("betclick event without markets skipped");
                continue;
            }

            let fragment = snippet(&item.to_string());
            match self.parse_event(item, category) {
                Ok(bet) => bets.push(bet),
                Err(e) => warn!("betclick: can not fetch all information from `{}`: {}", fragment, e),
            }
        }

        info!(count = bets.len(), "betclick bets found");
        Ok(bets)
    }
}

fn odds_for(selections: &[BetclickSelection], code: &str) -> Result<Decimal, FinderError> {
    let wanted = normalize_name(code);
    selections
        .iter()
        .find(|s| normalize_name(&s.name) == wanted)
        .map(|s| s.odds)
        .ok_or_else(|| FinderError::SelectionNotFound(code.to_string()))
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, FinderError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ")
        .map(|naive| naive.and_utc())
        .map_err(|e| FinderError::InvalidDate { value: raw.to_string(), reason: e.to_string() })
}
