//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts at rest are `i64` minor currency units (cents); no floating
//! point ever touches a ledger amount. Fractional weights (hours, role
//! weights, subtotal contributions) are `Decimal` and only exist inside
//! a computation.

use super::error::{TipError, TipResult};
use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed single amount (€1,000,000 in cents)
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;

/// Convert a cent amount to a Decimal currency value (display/report)
#[inline]
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Convert an f64 weight (hours, role weight, contribution fraction)
/// into a Decimal, rejecting non-finite or negative input
pub fn weight(value: f64) -> TipResult<Decimal> {
    if !value.is_finite() || value < 0.0 {
        return Err(TipError::InvalidAmount(format!(
            "weight must be a non-negative finite number, got {value}"
        )));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        TipError::InvalidAmount(format!("weight {value} is not representable"))
    })
}

/// `percent` of `amount_cents`, rounded half away from zero to a cent
pub fn percent_of(amount_cents: i64, percent: f64) -> TipResult<i64> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(TipError::InvalidAmount(format!(
            "percent must be between 0 and 100, got {percent}"
        )));
    }
    let pct = Decimal::from_f64(percent).ok_or_else(|| {
        TipError::InvalidAmount(format!("percent {percent} is not representable"))
    })?;
    let result = (Decimal::from(amount_cents) * pct / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    result
        .to_i64()
        .ok_or_else(|| TipError::InvalidAmount("percent result overflow".into()))
}

/// Split `amount_cents` across `weights`, exactly.
///
/// Largest-remainder allocation: each share is floored to a cent, then
/// the leftover cents go one each to the largest fractional remainders.
/// Ties break by larger raw share, then by position (join order), so the
/// result is deterministic for every input. The output always sums to
/// the input; anything else is an internal invariant violation and
/// fails loudly instead of leaking currency.
pub fn allocate(amount_cents: i64, weights: &[Decimal]) -> TipResult<Vec<i64>> {
    if amount_cents < 0 {
        return Err(TipError::InvalidAmount(format!(
            "cannot allocate a negative amount: {amount_cents}"
        )));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(TipError::InvalidAmount(format!(
            "amount exceeds maximum allowed ({MAX_AMOUNT_CENTS}), got {amount_cents}"
        )));
    }
    if weights.is_empty() {
        return Err(TipError::InvalidAmount("no recipients to allocate to".into()));
    }
    let total: Decimal = weights.iter().sum();
    if weights.iter().any(|w| w.is_sign_negative()) || total <= Decimal::ZERO {
        return Err(TipError::InvalidAmount(
            "weights must be non-negative with a positive sum".into(),
        ));
    }

    let amount = Decimal::from(amount_cents);
    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    let mut allocated: i64 = 0;

    for (idx, w) in weights.iter().enumerate() {
        let exact = amount * w / total;
        let floor = exact.floor();
        let share = floor.to_i64().ok_or_else(|| {
            TipError::InvalidAmount("allocated share overflow".into())
        })?;
        allocated += share;
        shares.push(share);
        remainders.push((exact - floor, exact, idx));
    }

    // Hand out leftover cents to the largest fractional remainders;
    // ties go to the larger raw share, then to the earlier position.
    let mut leftover = amount_cents - allocated;
    remainders.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.cmp(&a.1))
            .then_with(|| a.2.cmp(&b.2))
    });
    for &(_, _, idx) in remainders.iter() {
        if leftover == 0 {
            break;
        }
        shares[idx] += 1;
        leftover -= 1;
    }

    let sum: i64 = shares.iter().sum();
    if sum != amount_cents {
        return Err(TipError::RoundingResidual {
            input: amount_cents,
            allocated: sum,
        });
    }
    Ok(shares)
}

/// Equal weights for `n` recipients
pub fn equal_weights(n: usize) -> Vec<Decimal> {
    vec![Decimal::ONE; n]
}
