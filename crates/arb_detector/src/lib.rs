/// SurebetsFinder — Arb Detector
/// Páruje bety stejného zápasu napříč kancelářemi a hledá kombinace,
/// kde součet implied probability < 1 (garantovaný zisk)

mod stake;

pub use stake::{allocate, AllocationError};

use bet_model::{round_money, Bet, BetStore, Opponent, SureBet};
use chrono::{DateTime, Utc};
use logger::{now_iso, EventLogger, SureBetFoundEvent};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// 1/a + 1/b < 1  ⇔  a + b < a·b  (a, b > 0), bez dělení a zaokrouhlení
pub fn is_arbitrage(odds_a: Decimal, odds_b: Decimal) -> bool {
    if odds_a <= Decimal::ZERO || odds_b <= Decimal::ZERO {
        return false;
    }
    match (odds_a.checked_add(odds_b), odds_a.checked_mul(odds_b)) {
        (Some(sum), Some(product)) => sum < product,
        _ => false,
    }
}

pub struct SureBetsFinder {
    total_stake: Decimal,
}

impl Default for SureBetsFinder {
    fn default() -> Self {
        Self::new(Decimal::ONE_HUNDRED)
    }
}

impl SureBetsFinder {
    pub fn new(total_stake: Decimal) -> Self {
        Self { total_stake }
    }

    pub fn total_stake(&self) -> Decimal {
        self.total_stake
    }

    /// Čistá detekce nad snapshotem — každý neuspořádaný pár jednou
    pub fn find(&self, bets: &[Bet]) -> Result<Vec<SureBet>, AllocationError> {
        info!(bets = bets.len(), "Finding sure bets");

        let mut found = Vec::new();
        for (i, bet_1) in bets.iter().enumerate() {
            for bet_2 in &bets[i + 1..] {
                if bet_1.natural_key() != bet_2.natural_key() {
                    continue;
                }
                found.extend(self.evaluate_pair(bet_1, bet_2)?);
            }
        }

        info!(count = found.len(), "sure bets found");
        Ok(found)
    }

    /// Obě orientace páru se hodnotí nezávisle → 0, 1 nebo 2 sure bety
    fn evaluate_pair(&self, bet_1: &Bet, bet_2: &Bet) -> Result<Vec<SureBet>, AllocationError> {
        debug!(
            provider_1 = %bet_1.provider,
            provider_2 = %bet_2.provider,
            "{} vs {} — checking pair",
            bet_1.opponent_1,
            bet_1.opponent_2
        );

        let mut hits = Vec::with_capacity(2);

        if is_arbitrage(bet_1.odds_1, bet_2.odds_2) {
            let calc = allocate(bet_1.odds_1, bet_2.odds_2, self.total_stake)?;
            hits.push(SureBet::from_pair(bet_1, bet_2, Opponent::First, calc));
        }

        if is_arbitrage(bet_1.odds_2, bet_2.odds_1) {
            let calc = allocate(bet_1.odds_2, bet_2.odds_1, self.total_stake)?;
            hits.push(SureBet::from_pair(bet_1, bet_2, Opponent::Second, calc));
        }

        Ok(hits)
    }

    /// Snapshot budoucích betů → detekce → každý nález do sinku
    pub fn find_and_report<S, K>(
        &self,
        store: &S,
        sink: &mut K,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<SureBet>>
    where
        S: BetStore + ?Sized,
        K: SureBetSink + ?Sized,
    {
        let snapshot = store.get_all_future(now)?;
        let sure_bets = self.find(&snapshot)?;

        for sure_bet in &sure_bets {
            sink.emit(sure_bet)?;
        }

        Ok(sure_bets)
    }
}

// ── Sinky ────────────────────────────────────────────────────────────────────

/// Kam jde nalezený sure bet (journal, DB, notifikace…)
pub trait SureBetSink {
    fn emit(&mut self, sure_bet: &SureBet) -> anyhow::Result<()>;
}

impl SureBetSink for Vec<SureBet> {
    fn emit(&mut self, sure_bet: &SureBet) -> anyhow::Result<()> {
        self.push(sure_bet.clone());
        Ok(())
    }
}

/// Vypíše `info()` do logu a připíše SURE_BET_FOUND do JSONL journalu
pub struct JournalSink {
    logger: EventLogger,
}

impl JournalSink {
    pub fn new(log_dir: impl Into<std::path::PathBuf>) -> Self {
        Self { logger: EventLogger::new(log_dir) }
    }
}

impl SureBetSink for JournalSink {
    fn emit(&mut self, sure_bet: &SureBet) -> anyhow::Result<()> {
        let calc = sure_bet.calculation_result();

        info!(
            sure_bet_id = %sure_bet.id(),
            benefit = %calc.benefit_1,
            "{}",
            sure_bet.info()
        );

        let [bet_1, bet_2] = sure_bet.bets();
        let ev = SureBetFoundEvent {
            ts:                  now_iso(),
            event:               "SURE_BET_FOUND",
            sure_bet_id:         sure_bet.id().to_string(),
            bets:                [bet_1.to_string(), bet_2.to_string()],
            opponent_1:          sure_bet.opponent_1().to_string(),
            opponent_2:          sure_bet.opponent_2().to_string(),
            winning:             winning_label(sure_bet.winning()).to_string(),
            odds_for_opponent_1: sure_bet.odds_for_opponent_1().to_string(),
            odds_for_opponent_2: sure_bet.odds_for_opponent_2().to_string(),
            url_1:               sure_bet.url_1().to_string(),
            url_2:               sure_bet.url_2().to_string(),
            stake_1:             round_money(calc.stake_1).to_string(),
            stake_2:             round_money(calc.stake_2).to_string(),
            profit_1:            round_money(calc.profit_1).to_string(),
            profit_2:            round_money(calc.profit_2).to_string(),
            benefit_1:           calc.benefit_1.clone(),
            benefit_2:           calc.benefit_2.clone(),
        };

        self.logger.log(&ev)
    }
}

pub fn winning_label(winning: Opponent) -> &'static str {
    match winning {
        Opponent::First  => "opponent_1",
        Opponent::Second => "opponent_2",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bet_model::{Category, MemoryBetStore, Provider};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn event_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 21, 17, 0, 0).unwrap()
    }

    fn bet(provider: Provider, odds_1: Decimal, odds_2: Decimal) -> Bet {
        Bet::new(
            "natus vincere",
            "g2 esports",
            odds_1,
            odds_2,
            Category::Esport,
            provider,
            event_date(),
            "/navi-g2",
        )
    }

    #[test]
    fn arbitrage_check_is_strict() {
        assert!(is_arbitrage(dec!(2.10), dec!(2.05)));
        assert!(!is_arbitrage(dec!(2.00), dec!(2.00)));
        assert!(!is_arbitrage(dec!(3.00), dec!(1.50)));
        assert!(!is_arbitrage(dec!(0), dec!(5.0)));
    }

    #[test]
    fn flags_opponent_1_arbitrage_on_reference_pair() {
        let a = bet(Provider::Efortuna, dec!(2.10), dec!(1.80));
        let b = bet(Provider::Betclick, dec!(1.90), dec!(2.05));

        let found = SureBetsFinder::default().find(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(found.len(), 1);
        let sure_bet = &found[0];
        assert!(sure_bet.opponent_1_winning());
        assert_eq!(sure_bet.bets(), [a.id, b.id]);
        assert_eq!(sure_bet.odds_for_opponent_1(), dec!(2.10));
        assert_eq!(sure_bet.odds_for_opponent_2(), dec!(2.05));
        assert_eq!(sure_bet.url_1(), a.full_url());
        assert_eq!(sure_bet.url_2(), b.full_url());

        let calc = sure_bet.calculation_result();
        assert_eq!(calc.stake_1.round_dp(1), dec!(49.4));
        assert_eq!(calc.stake_2.round_dp(1), dec!(50.6));
        assert!(calc.profit_1 > Decimal::ZERO);
        assert!((calc.profit_1 - calc.profit_2).abs() < dec!(0.000000000001));
    }

    #[test]
    fn opponent_2_orientation_backs_bet_1_second_leg() {
        let a = bet(Provider::Lvbet, dec!(1.70), dec!(2.30));
        let b = bet(Provider::Efortuna, dec!(1.95), dec!(1.60));

        let found = SureBetsFinder::default().find(&[a, b]).unwrap();

        assert_eq!(found.len(), 1);
        let sure_bet = &found[0];
        assert!(sure_bet.opponent_2_winning());
        assert_eq!(sure_bet.odds_for_opponent_1(), dec!(1.95));
        assert_eq!(sure_bet.odds_for_opponent_2(), dec!(2.30));
        assert_eq!(sure_bet.leg_odds(), (dec!(2.30), dec!(1.95)));
    }

    #[test]
    fn no_sure_bet_when_both_orientations_lose() {
        let a = bet(Provider::Efortuna, dec!(1.80), dec!(1.95));
        let b = bet(Provider::Betclick, dec!(1.85), dec!(1.90));

        assert!(SureBetsFinder::default().find(&[a, b]).unwrap().is_empty());
    }

    #[test]
    fn different_events_are_never_paired() {
        let a = bet(Provider::Efortuna, dec!(3.00), dec!(3.00));
        let mut b = bet(Provider::Betclick, dec!(3.00), dec!(3.00));
        b.date = event_date() + Duration::hours(1);
        let mut c = bet(Provider::Lvbet, dec!(3.00), dec!(3.00));
        c.opponent_2 = "fnatic".to_string();

        assert!(SureBetsFinder::default().find(&[a, b, c]).unwrap().is_empty());
    }

    #[test]
    fn both_orientations_can_hit_on_one_pair() {
        let a = bet(Provider::Efortuna, dec!(2.50), dec!(2.50));
        let b = bet(Provider::Lvbet, dec!(2.50), dec!(2.50));

        let found = SureBetsFinder::default().find(&[a, b]).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].opponent_1_winning());
        assert!(found[1].opponent_2_winning());
    }

    #[test]
    fn invalid_total_stake_aborts_detection() {
        let a = bet(Provider::Efortuna, dec!(2.10), dec!(1.80));
        let b = bet(Provider::Betclick, dec!(1.90), dec!(2.05));

        assert!(matches!(
            SureBetsFinder::new(dec!(0)).find(&[a, b]),
            Err(AllocationError::InvalidStakeParameters { .. })
        ));
    }

    #[test]
    fn find_and_report_reads_future_snapshot_and_emits() {
        let mut store = MemoryBetStore::new();
        store.create(&bet(Provider::Efortuna, dec!(2.10), dec!(1.80))).unwrap();
        store.create(&bet(Provider::Betclick, dec!(1.90), dec!(2.05))).unwrap();

        let mut collected: Vec<SureBet> = Vec::new();
        let finder = SureBetsFinder::default();

        let before = event_date() - Duration::days(1);
        let reported = finder.find_and_report(&store, &mut collected, before).unwrap();
        assert_eq!(reported.len(), 1);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].id(), reported[0].id());

        // po začátku zápasu už snapshot nic neobsahuje
        let after = event_date() + Duration::minutes(1);
        assert!(finder.find_and_report(&store, &mut collected, after).unwrap().is_empty());
        assert_eq!(collected.len(), 1);
    }

    #[test]
    fn journal_sink_appends_rounded_event() {
        let dir = tempfile::tempdir().unwrap();
        let a = bet(Provider::Efortuna, dec!(2.10), dec!(1.80));
        let b = bet(Provider::Betclick, dec!(1.90), dec!(2.05));
        let found = SureBetsFinder::default().find(&[a, b]).unwrap();

        let mut sink = JournalSink::new(dir.path());
        sink.emit(&found[0]).unwrap();

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let body = std::fs::read_to_string(dir.path().join(format!("{date}.jsonl"))).unwrap();
        let event: serde_json::Value = serde_json::from_str(body.trim()).unwrap();

        assert_eq!(event["event"], "SURE_BET_FOUND");
        assert_eq!(event["winning"], "opponent_1");
        assert_eq!(event["odds_for_opponent_1"], "2.10");
        assert_eq!(event["stake_1"], "49.40");
        assert_eq!(event["stake_2"], "50.60");
        assert_eq!(event["benefit_1"], "3.73%");
    }
}
