//! Rozdělení vkladu mezi dvě nohy sure betu
//!
//! Řeší soustavu
//!   stake_1 + stake_2 = total
//!   odds_1 * stake_1  = odds_2 * stake_2
//! v uzavřeném tvaru, celé v `Decimal`.

use bet_model::InvestmentCalculationResult;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("invalid stake parameters: odds_1={odds_1}, odds_2={odds_2}, total={total_stake}")]
    InvalidStakeParameters {
        odds_1:      Decimal,
        odds_2:      Decimal,
        total_stake: Decimal,
    },

    #[error("decimal overflow while allocating stakes")]
    Overflow,
}

pub fn allocate(
    odds_1: Decimal,
    odds_2: Decimal,
    total_stake: Decimal,
) -> Result<InvestmentCalculationResult, AllocationError> {
    if odds_1 <= Decimal::ZERO || odds_2 <= Decimal::ZERO || total_stake <= Decimal::ZERO {
        return Err(AllocationError::InvalidStakeParameters { odds_1, odds_2, total_stake });
    }

    let odds_sum = odds_1.checked_add(odds_2).ok_or(AllocationError::Overflow)?;
    let stake_1 = split(total_stake, odds_2, odds_sum)?;
    let stake_2 = split(total_stake, odds_1, odds_sum)?;

    let profit_1 = profit(odds_1, stake_1, total_stake)?;
    let profit_2 = profit(odds_2, stake_2, total_stake)?;

    let invested = stake_1.checked_add(stake_2).ok_or(AllocationError::Overflow)?;

    Ok(InvestmentCalculationResult {
        stake_1,
        stake_2,
        profit_1,
        profit_2,
        benefit_1: benefit(profit_1, invested)?,
        benefit_2: benefit(profit_2, invested)?,
    })
}

/// total * odds_other / (odds_1 + odds_2)
fn split(total: Decimal, odds_other: Decimal, odds_sum: Decimal) -> Result<Decimal, AllocationError> {
    total
        .checked_mul(odds_other)
        .and_then(|v| v.checked_div(odds_sum))
        .ok_or(AllocationError::Overflow)
}

fn profit(odds: Decimal, stake: Decimal, total: Decimal) -> Result<Decimal, AllocationError> {
    odds.checked_mul(stake)
        .and_then(|payout| payout.checked_sub(total))
        .ok_or(AllocationError::Overflow)
}

/// "3.73%" — round-half-up na 2 místa
fn benefit(profit: Decimal, invested: Decimal) -> Result<String, AllocationError> {
    let pct = profit
        .checked_div(invested)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(AllocationError::Overflow)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Ok(format!("{pct:.2}%"))
}
