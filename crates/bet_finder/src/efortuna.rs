//! efortuna.pl — HTML tabulka zápasů
//!
//! Řádek nabídky:
//!   <tr>
//!     <td><a class="event-name" href="/zaklady-bukmacherskie/..."><span class="market-name">A - B</span></a></td>
//!     <td><span class="odds-value">2.10</span></td>
//!     <td><span class="odds-value">1.75</span></td>
//!     <td><span class="event-datetime">19.10.&nbsp;18:30</span></td>
//!   </tr>
//!
//! Datum je bez roku a v lokálním čase Varšavy.

use bet_model::{Bet, Category, Provider};
use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{Europe::Warsaw, Tz};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::{extract_opponents, parse_decimal, snippet, BetFinder, FinderError};

const SKIPPED_ROW_CLASSES: [&str; 2] = ["running-live", "row-sub-markets"];

struct RowSelectors {
    market_name: Selector,
    odds:        Selector,
    datetime:    Selector,
    link:        Selector,
}

impl RowSelectors {
    fn new() -> Result<Self, FinderError> {
        Ok(Self {
            market_name: selector(".market-name")?,
            odds:        selector(".odds-value")?,
            datetime:    selector(".event-datetime")?,
            link:        selector("a.event-name")?,
        })
    }
}

pub struct EfortunaBetFinder {
    timezone: Tz,
    /// None = aktuální UTC rok v okamžiku parsování
    year: Option<i32>,
}

impl Default for EfortunaBetFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl EfortunaBetFinder {
    pub fn new() -> Self {
        Self { timezone: Warsaw, year: None }
    }

    /// Pevný rok — pro přehrání starších payloadů
    pub fn for_year(year: i32) -> Self {
        Self { timezone: Warsaw, year: Some(year) }
    }

    fn parse_row(
        &self,
        row: ElementRef<'_>,
        sel: &RowSelectors,
        category: Category,
        year: i32,
    ) -> Result<Bet, FinderError> {
        let (opponent_1, opponent_2) = find_opponents(row, sel)?;
        let (odds_1, odds_2) = find_odds(row, sel)?;
        let date = self.find_date(row, sel, year)?;
        let url = find_url(row, sel)?;

        Ok(Bet::new(opponent_1, opponent_2, odds_1, odds_2, category, Provider::Efortuna, date, url))
    }

    fn find_date(&self, row: ElementRef<'_>, sel: &RowSelectors, year: i32) -> Result<DateTime<Utc>, FinderError> {
        let node = row
            .select(&sel.datetime)
            .next()
            .ok_or(FinderError::MissingElement(".event-datetime"))?;
        self.parse_local_date(&element_text(node), year)
    }

    /// "19.10. 18:30" (+ rok) v lokálním čase → UTC
    fn parse_local_date(&self, raw: &str, year: i32) -> Result<DateTime<Utc>, FinderError> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let [day_month, time] = tokens.as_slice() else {
            return Err(invalid_date(raw, "expected `dd.mm. HH:MM`"));
        };

        let candidate = format!("{day_month}{year} {time}");
        let naive = NaiveDateTime::parse_from_str(&candidate, "%d.%m.%Y %H:%M")
            .map_err(|e| invalid_date(raw, &e.to_string()))?;

        // Při přechodu na zimní čas bereme dřívější okamžik
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| invalid_date(raw, "local time does not exist"))
    }
}

impl BetFinder for EfortunaBetFinder {
    fn provider(&self) -> Provider {
        Provider::Efortuna
    }

    fn find_bets(&self, content: &str, category: Category) -> Result<Vec<Bet>, FinderError> {
        info!("Finding bets for efortuna.pl");

        let rows = selector("table tbody tr")?;
        let sel = RowSelectors::new()?;
        let year = self.year.unwrap_or_else(|| Utc::now().year());
        let document = Html::parse_document(content);

        let mut bets = Vec::new();
        for row in document.select(&rows) {
            if let Some(class) = row.value().classes().find(|c| SKIPPED_ROW_CLASSES.contains(c)) {
                debug!(class, "efortuna row skipped");
                continue;
            }

            match self.parse_row(row, &sel, category, year) {
                Ok(bet) => bets.push(bet),
                Err(e) => warn!(
                    "efortuna: can not fetch all information from `{}`: {}",
                    snippet(&row.html()),
                    e
                ),
            }
        }

        info!(count = bets.len(), "efortuna bets found");
        Ok(bets)
    }
}

fn selector(css: &'static str) -> Result<Selector, FinderError> {
    Selector::parse(css).map_err(|_| FinderError::InvalidSelector(css))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

fn invalid_date(raw: &str, reason: &str) -> FinderError {
    FinderError::InvalidDate { value: raw.trim().to_string(), reason: reason.to_string() }
}

fn find_opponents(row: ElementRef<'_>, sel: &RowSelectors) -> Result<(String, String), FinderError> {
    let node = row
        .select(&sel.market_name)
        .next()
        .ok_or(FinderError::MissingElement(".market-name"))?;
    extract_opponents(&element_text(node))
}

fn find_odds(row: ElementRef<'_>, sel: &RowSelectors) -> Result<(Decimal, Decimal), FinderError> {
    let values: Vec<String> = row.select(&sel.odds).map(element_text).collect();
    match values.as_slice() {
        [odds_1, odds_2] => Ok((parse_decimal(odds_1)?, parse_decimal(odds_2)?)),
        other => Err(FinderError::UnexpectedOddsCount(other.len())),
    }
}

fn find_url(row: ElementRef<'_>, sel: &RowSelectors) -> Result<String, FinderError> {
    let link = row
        .select(&sel.link)
        .next()
        .ok_or(FinderError::MissingElement("a.event-name"))?;
    Ok(link.value().attr("href").unwrap_or_default().to_string())
}
