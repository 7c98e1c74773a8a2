//! Kontrakty úložišť, na kterých stojí import i detekce.
//!
//! Core nikdy neví, kde data leží — dostane implementaci zvenku (SQLite v
//! binárce, `MemoryBetStore` v testech).

use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use thiserror::Error;
use uuid::Uuid;

use crate::{Bet, Provider, RawContent};

#[derive(Error, Debug)]
pub enum StoreError {
    /// Očekávaný výsledek dotazu, ne porucha
    #[error("{0} does not exist")]
    NotFound(String),

    #[error("store backend failure: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl StoreError {
    pub fn backend(err: impl StdError + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Dotaz pro upsert: natural key + kancelář
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetLookup {
    pub opponent_1: String,
    pub opponent_2: String,
    pub date:       DateTime<Utc>,
    pub provider:   Provider,
}

impl BetLookup {
    pub fn for_bet(bet: &Bet) -> Self {
        Self {
            opponent_1: bet.opponent_1.clone(),
            opponent_2: bet.opponent_2.clone(),
            date:       bet.date,
            provider:   bet.provider,
        }
    }

    pub fn matches(&self, bet: &Bet) -> bool {
        bet.opponent_1 == self.opponent_1
            && bet.opponent_2 == self.opponent_2
            && bet.date == self.date
            && bet.provider == self.provider
    }
}

impl std::fmt::Display for BetLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bet opponent_1={}, opponent_2={}, date={}, provider={}",
            self.opponent_1, self.opponent_2, self.date, self.provider
        )
    }
}

pub trait BetStore {
    fn create(&mut self, bet: &Bet) -> Result<(), StoreError>;

    /// Plný update záznamu podle `bet.id`
    fn save(&mut self, bet: &Bet) -> Result<(), StoreError>;

    /// `StoreError::NotFound` pokud nic neodpovídá
    fn find_one(&self, lookup: &BetLookup) -> Result<Bet, StoreError>;

    /// Snapshot betů s `date >= now`
    fn get_all_future(&self, now: DateTime<Utc>) -> Result<Vec<Bet>, StoreError>;
}

pub trait RawContentSource {
    fn get_all_unprocessed(&self) -> Result<Vec<RawContent>, StoreError>;

    fn mark_processed(&mut self, id: Uuid) -> Result<(), StoreError>;
}

// ── In-memory implementace ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryBetStore {
    bets: Vec<Bet>,
}

impl MemoryBetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }
}

impl BetStore for MemoryBetStore {
    fn create(&mut self, bet: &Bet) -> Result<(), StoreError> {
        self.bets.push(bet.clone());
        Ok(())
    }

    fn save(&mut self, bet: &Bet) -> Result<(), StoreError> {
        match self.bets.iter_mut().find(|b| b.id == bet.id) {
            Some(existing) => {
                *existing = bet.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("bet with id `{}`", bet.id))),
        }
    }

    fn find_one(&self, lookup: &BetLookup) -> Result<Bet, StoreError> {
        self.bets
            .iter()
            .find(|b| lookup.matches(b))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(lookup.to_string()))
    }

    fn get_all_future(&self, now: DateTime<Utc>) -> Result<Vec<Bet>, StoreError> {
        Ok(self.bets.iter().filter(|b| b.date >= now).cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRawContentStore {
    items: Vec<RawContent>,
}

impl MemoryRawContentStore {
    pub fn new(items: Vec<RawContent>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[RawContent] {
        &self.items
    }
}

impl RawContentSource for MemoryRawContentStore {
    fn get_all_unprocessed(&self) -> Result<Vec<RawContent>, StoreError> {
        Ok(self.items.iter().filter(|r| !r.was_processed).cloned().collect())
    }

    fn mark_processed(&mut self, id: Uuid) -> Result<(), StoreError> {
        let item = self
            .items
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("raw content with id `{id}`")))?;
        item.was_processed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, Provider};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn bet_at(date: DateTime<Utc>) -> Bet {
        Bet::new("a", "b", dec!(2.0), dec!(1.8), Category::Esport, Provider::Efortuna, date, "/x")
    }

    #[test]
    fn find_one_misses_are_not_found() {
        let store = MemoryBetStore::new();
        let lookup = BetLookup::for_bet(&bet_at(Utc::now()));

        let err = store.find_one(&lookup).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn find_one_requires_same_provider() {
        let mut store = MemoryBetStore::new();
        let bet = bet_at(Utc::now());
        store.create(&bet).unwrap();

        let mut lookup = BetLookup::for_bet(&bet);
        assert_eq!(store.find_one(&lookup).unwrap().id, bet.id);

        lookup.provider = Provider::Lvbet;
        assert!(store.find_one(&lookup).unwrap_err().is_not_found());
    }

    #[test]
    fn get_all_future_includes_now_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let mut store = MemoryBetStore::new();
        store.create(&bet_at(now - Duration::hours(1))).unwrap();
        store.create(&bet_at(now)).unwrap();
        store.create(&bet_at(now + Duration::days(2))).unwrap();

        assert_eq!(store.get_all_future(now).unwrap().len(), 2);
    }

    #[test]
    fn raw_content_marked_processed_disappears_from_queue() {
        let first = RawContent::new("[]", Category::Esport, Provider::Lvbet);
        let second = RawContent::new("[]", Category::Esport, Provider::Betclick);
        let first_id = first.id;
        let mut store = MemoryRawContentStore::new(vec![first, second]);

        store.mark_processed(first_id).unwrap();

        let pending = store.get_all_unprocessed().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].provider, Provider::Betclick);
        assert!(store.mark_processed(uuid::Uuid::new_v4()).unwrap_err().is_not_found());
    }
}
