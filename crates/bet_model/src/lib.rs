/// SurebetsFinder — doménový model
///
/// Sázka jedné kanceláře (Bet), nalezený sure bet (SureBet) a výsledek
/// kalkulace vkladů. Kontrakty úložišť jsou v modulu `store`.

pub mod store;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

pub use store::{
    BetLookup, BetStore, MemoryBetStore, MemoryRawContentStore, RawContentSource, StoreError,
};

// ── Chyby konfigurace ────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("provider `{0}` is not a suitable choice")]
    UnsupportedProvider(String),

    #[error("category `{0}` is not a correct value, possible values: {values}", values = Category::values().join(", "))]
    UnsupportedCategory(String),
}

// ── Provider / Category ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Efortuna,
    Betclick,
    Lvbet,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Efortuna, Provider::Betclick, Provider::Lvbet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Efortuna => "efortuna",
            Provider::Betclick => "betclick",
            Provider::Lvbet    => "lvbet",
        }
    }

    /// Složí absolutní odkaz z relativní cesty — každá kancelář má jinou šablonu
    pub fn full_url(&self, relative: &str) -> String {
        match self {
            Provider::Efortuna => format!("https://www.efortuna.pl{relative}"),
            Provider::Betclick => format!("https://www.betclic.pl/{relative}"),
            Provider::Lvbet    => format!("https://lvbet.pl/en/pre-matches/{relative}"),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "efortuna" => Ok(Provider::Efortuna),
            "betclick" => Ok(Provider::Betclick),
            "lvbet"    => Ok(Provider::Lvbet),
            _ => Err(ModelError::UnsupportedProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Esport,
}

impl Category {
    pub const ALL: [Category; 1] = [Category::Esport];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Esport => "esport",
        }
    }

    pub fn values() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "esport" => Ok(Category::Esport),
            _ => Err(ModelError::UnsupportedCategory(s.to_string())),
        }
    }
}

// ── Pomocné funkce ───────────────────────────────────────────────────────────

/// NFC + lowercase + jedna mezera mezi slovy
pub fn normalize_name(raw: &str) -> String {
    let composed: String = raw.nfc().collect();
    composed
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Zaokrouhlení na 2 místa (round-half-up) — jen na hranici úložiště
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ── Bet ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id:         Uuid,
    pub opponent_1: String,
    pub opponent_2: String,
    pub odds_1:     Decimal,
    pub odds_2:     Decimal,
    pub category:   Category,
    pub provider:   Provider,
    pub date:       DateTime<Utc>,
    pub url:        String,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Business identita zápasu nezávislá na kanceláři
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NaturalKey<'a> {
    pub opponent_1: &'a str,
    pub opponent_2: &'a str,
    pub date:       DateTime<Utc>,
}

impl Bet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        opponent_1: impl Into<String>,
        opponent_2: impl Into<String>,
        odds_1:     Decimal,
        odds_2:     Decimal,
        category:   Category,
        provider:   Provider,
        date:       DateTime<Utc>,
        url:        impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            opponent_1: opponent_1.into(),
            opponent_2: opponent_2.into(),
            odds_1,
            odds_2,
            category,
            provider,
            date,
            url: url.into(),
            updated_at: now,
            created_at: now,
        }
    }

    pub fn natural_key(&self) -> NaturalKey<'_> {
        NaturalKey {
            opponent_1: &self.opponent_1,
            opponent_2: &self.opponent_2,
            date:       self.date,
        }
    }

    pub fn full_url(&self) -> String {
        self.provider.full_url(&self.url)
    }
}

// ── SureBet ──────────────────────────────────────────────────────────────────

/// Který soupeř vyhrává přes nohu prvního betu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opponent {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentCalculationResult {
    pub stake_1:   Decimal,
    pub stake_2:   Decimal,
    pub profit_1:  Decimal,
    pub profit_2:  Decimal,
    pub benefit_1: String,
    pub benefit_2: String,
}

/// Arbitráž mezi dvěma bety stejného zápasu. Po vytvoření se nemění.
#[derive(Debug, Clone, Serialize)]
pub struct SureBet {
    id:                  Uuid,
    bets:                [Uuid; 2],
    opponent_1:          String,
    opponent_2:          String,
    odds_for_opponent_1: Decimal,
    odds_for_opponent_2: Decimal,
    url_1:               String,
    url_2:               String,
    winning:             Opponent,
    calculation_result:  InvestmentCalculationResult,
    created_at:          DateTime<Utc>,
}

impl SureBet {
    /// `winning` = soupeř, na kterého sází noha `bet_1`; `bet_2` kryje toho druhého
    pub fn from_pair(
        bet_1: &Bet,
        bet_2: &Bet,
        winning: Opponent,
        calculation_result: InvestmentCalculationResult,
    ) -> Self {
        let (odds_for_opponent_1, odds_for_opponent_2) = match winning {
            Opponent::First  => (bet_1.odds_1, bet_2.odds_2),
            Opponent::Second => (bet_2.odds_1, bet_1.odds_2),
        };

        Self {
            id: Uuid::new_v4(),
            bets: [bet_1.id, bet_2.id],
            opponent_1: bet_1.opponent_1.clone(),
            opponent_2: bet_1.opponent_2.clone(),
            odds_for_opponent_1,
            odds_for_opponent_2,
            url_1: bet_1.full_url(),
            url_2: bet_2.full_url(),
            winning,
            calculation_result,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn bets(&self) -> [Uuid; 2] { self.bets }
    pub fn opponent_1(&self) -> &str { &self.opponent_1 }
    pub fn opponent_2(&self) -> &str { &self.opponent_2 }
    pub fn odds_for_opponent_1(&self) -> Decimal { self.odds_for_opponent_1 }
    pub fn odds_for_opponent_2(&self) -> Decimal { self.odds_for_opponent_2 }
    pub fn url_1(&self) -> &str { &self.url_1 }
    pub fn url_2(&self) -> &str { &self.url_2 }
    pub fn winning(&self) -> Opponent { self.winning }
    pub fn opponent_1_winning(&self) -> bool { self.winning == Opponent::First }
    pub fn opponent_2_winning(&self) -> bool { self.winning == Opponent::Second }
    pub fn calculation_result(&self) -> &InvestmentCalculationResult { &self.calculation_result }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Kurzy nohou v pořadí (bet_1, bet_2) — odpovídají stake_1 / stake_2
    pub fn leg_odds(&self) -> (Decimal, Decimal) {
        match self.winning {
            Opponent::First  => (self.odds_for_opponent_1, self.odds_for_opponent_2),
            Opponent::Second => (self.odds_for_opponent_2, self.odds_for_opponent_1),
        }
    }

    /// Čitelný popis pro log / notifikaci
    pub fn info(&self) -> String {
        let (leg_1_backs, leg_2_backs) = match self.winning {
            Opponent::First  => (&self.opponent_1, &self.opponent_2),
            Opponent::Second => (&self.opponent_2, &self.opponent_1),
        };
        let (odds_leg_1, odds_leg_2) = self.leg_odds();
        let calc = &self.calculation_result;

        format!(
            "SURE BET: {} vs {}\n\
             \x20 leg 1: {} wins @ {} | stake {} | profit {} ({})\n\
             \x20        {}\n\
             \x20 leg 2: {} wins @ {} | stake {} | profit {} ({})\n\
             \x20        {}",
            self.opponent_1,
            self.opponent_2,
            leg_1_backs,
            odds_leg_1,
            round_money(calc.stake_1),
            round_money(calc.profit_1),
            calc.benefit_1,
            self.url_1,
            leg_2_backs,
            odds_leg_2,
            round_money(calc.stake_2),
            round_money(calc.profit_2),
            calc.benefit_2,
            self.url_2,
        )
    }
}

// ── RawContent ───────────────────────────────────────────────────────────────

/// Jeden stažený payload (HTML / JSON) pro kombinaci provider × kategorie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContent {
    pub id:            Uuid,
    pub content:       String,
    pub category:      Category,
    pub provider:      Provider,
    pub was_processed: bool,
    pub created_at:    DateTime<Utc>,
}

impl RawContent {
    pub fn new(content: impl Into<String>, category: Category, provider: Provider) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            category,
            provider,
            was_processed: false,
            created_at: Utc::now(),
        }
    }
}
