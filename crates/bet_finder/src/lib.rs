/// SurebetsFinder — Bet Finder
///
/// Převádí surové payloady kanceláří na kanonické `Bet`:
///   - efortuna: HTML tabulka (scraper)
///   - betclick: JSON feed událostí
///   - lvbet:    JSON feed zápasů
///
/// Vadný záznam se zaloguje a přeskočí, zbytek payloadu jede dál.

mod betclick;
mod efortuna;
mod lvbet;

pub use betclick::BetclickBetFinder;
pub use efortuna::EfortunaBetFinder;
pub use lvbet::LvbetBetFinder;

use bet_model::{normalize_name, Bet, Category, ModelError, Provider};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("standalone separator `-` not found in `{0}`")]
    SeparatorNotFound(String),

    #[error("empty opponent name in `{0}`")]
    EmptyOpponent(String),

    #[error("element `{0}` not found")]
    MissingElement(&'static str),

    #[error("expected exactly 2 odds, found {0}")]
    UnexpectedOddsCount(usize),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("invalid date `{value}`: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("no selection named `{0}`")]
    SelectionNotFound(String),

    #[error("invalid css selector `{0}`")]
    InvalidSelector(&'static str),

    #[error("malformed record: {0}")]
    MalformedRecord(#[source] serde_json::Error),

    #[error("payload is not parseable: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Společné rozhraní všech normalizérů
pub trait BetFinder {
    fn provider(&self) -> Provider;

    /// `Err` jen pokud nejde přečíst celý payload; vadné záznamy se přeskakují
    fn find_bets(&self, content: &str, category: Category) -> Result<Vec<Bet>, FinderError>;
}

pub fn finder_for(provider: Provider) -> Box<dyn BetFinder + Send + Sync> {
    match provider {
        Provider::Efortuna => Box::new(EfortunaBetFinder::new()),
        Provider::Betclick => Box::new(BetclickBetFinder),
        Provider::Lvbet    => Box::new(LvbetBetFinder),
    }
}

/// Jméno z konfigurace / DB → finder; neznámý provider je chyba hned
pub fn finder_for_name(name: &str) -> Result<Box<dyn BetFinder + Send + Sync>, ModelError> {
    Ok(finder_for(Provider::from_str(name)?))
}

// ── Opponent-pair parser ─────────────────────────────────────────────────────

/// "Team A  -  Team B" → ("team a", "team b")
pub fn extract_opponents(raw: &str) -> Result<(String, String), FinderError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let index = tokens
        .iter()
        .position(|t| *t == "-")
        .ok_or_else(|| FinderError::SeparatorNotFound(raw.to_string()))?;

    let opponent_1 = normalize_name(&tokens[..index].join(" "));
    let opponent_2 = normalize_name(&tokens[index + 1..].join(" "));

    if opponent_1.is_empty() || opponent_2.is_empty() {
        return Err(FinderError::EmptyOpponent(raw.to_string()));
    }

    Ok((opponent_1, opponent_2))
}

// ── Sdílené helpery ──────────────────────────────────────────────────────────

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, FinderError> {
    let cleaned = raw.trim().replace(',', ".");
    Decimal::from_str(&cleaned).map_err(|_| FinderError::InvalidNumber(raw.trim().to_string()))
}

/// Kurz ve feedu bývá číslo i string — obojí bez průchodu přes f64
pub(crate) fn de_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => return Err(serde::de::Error::custom(format!("expected decimal, got {other}"))),
    };
    parse_decimal(&raw).map_err(serde::de::Error::custom)
}

/// Payload může být víc JSON polí za sebou (klient lepí odpovědi více URL)
pub(crate) fn json_records(content: &str) -> Result<Vec<Value>, FinderError> {
    let mut records = Vec::new();
    for chunk in serde_json::Deserializer::from_str(content).into_iter::<Vec<Value>>() {
        records.extend(chunk.map_err(FinderError::Payload)?);
    }
    Ok(records)
}

/// Zkrácený výřez pro log — celé payloady jsou obrovské
pub(crate) fn snippet(raw: &str) -> String {
    let compact = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() > 200 {
        format!("{}…", compact.chars().take(200).collect::<String>())
    } else {
        compact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_opponents_handles_irregular_whitespace() {
        let (a, b) = extract_opponents("  Natus Vincere \n\t -   Team   VITALITY  ").unwrap();
        assert_eq!(a, "natus vincere");
        assert_eq!(b, "team vitality");
    }

    #[test]
    fn extract_opponents_keeps_hyphenated_names() {
        let (a, b) = extract_opponents("Team-Spirit - Movistar Riders").unwrap();
        assert_eq!(a, "team-spirit");
        assert_eq!(b, "movistar riders");
    }

    #[test]
    fn extract_opponents_treats_nbsp_as_whitespace() {
        let (a, b) = extract_opponents("G2\u{a0}-\u{a0}Fnatic").unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("g2", "fnatic"));
    }

    #[test]
    fn extract_opponents_fails_without_standalone_separator() {
        assert!(matches!(
            extract_opponents("Team-Spirit vs G2"),
            Err(FinderError::SeparatorNotFound(_))
        ));
        assert!(matches!(
            extract_opponents("Astralis -"),
            Err(FinderError::EmptyOpponent(_))
        ));
    }

    #[test]
    fn no_separator_artifacts_survive() {
        let inputs = ["A - B", " A   -B C - D", "x\t-\ty", "Ence  -  Heroic  "];
        for input in inputs {
            let (a, b) = extract_opponents(input).unwrap();
            for side in [&a, &b] {
                assert_eq!(side.trim(), side.as_str());
                assert!(!side.contains("  "));
                assert!(!side.is_empty() && *side != "-");
                assert_eq!(side.to_lowercase(), *side);
            }
        }
        // první samostatný "-" dělí, další patří druhému jménu
        assert_eq!(
            extract_opponents(" A   -B C - D").unwrap(),
            ("a -b c".to_string(), "d".to_string())
        );
    }

    #[test]
    fn finder_factory_tags_provider() {
        for provider in Provider::ALL {
            assert_eq!(finder_for(provider).provider(), provider);
        }
        assert_eq!(finder_for_name("lvbet").unwrap().provider(), Provider::Lvbet);
        assert!(matches!(
            finder_for_name("bet365"),
            Err(ModelError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn parse_decimal_accepts_comma_and_rejects_garbage() {
        assert_eq!(parse_decimal(" 2,10 ").unwrap().to_string(), "2.10");
        assert!(matches!(parse_decimal("N/A"), Err(FinderError::InvalidNumber(_))));
    }

    #[test]
    fn json_records_reads_concatenated_arrays() {
        let records = json_records("[{\"a\":1}]\n[{\"b\":2},{\"c\":3}]").unwrap();
        assert_eq!(records.len(), 3);
        assert!(matches!(json_records("{not json"), Err(FinderError::Payload(_))));
    }
}
