//! Money rounding to integer minor currency units.
//!
//! All rounding runs on exact decimal arithmetic; the float entry point
//! converts through the decimal path rather than rounding the float
//! directly, so stake-times-ratio products cannot drift at the cent level.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;

/// Rounding rule selector, stored as a raw `i16` on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingRule {
    /// Round half away from zero.
    Nearest,
    /// Always round away from zero.
    Up,
    /// Truncate toward zero.
    Down,
}

impl RoundingRule {
    pub fn from_raw(raw: i16) -> Option<Self> {
        match raw {
            0 => Some(RoundingRule::Nearest),
            1 => Some(RoundingRule::Up),
            2 => Some(RoundingRule::Down),
            _ => None,
        }
    }

    pub fn raw(self) -> i16 {
        match self {
            RoundingRule::Nearest => 0,
            RoundingRule::Up => 1,
            RoundingRule::Down => 2,
        }
    }

    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingRule::Nearest => RoundingStrategy::MidpointAwayFromZero,
            RoundingRule::Up => RoundingStrategy::AwayFromZero,
            RoundingRule::Down => RoundingStrategy::ToZero,
        }
    }
}

/// Round a decimal amount to an integer value under the given rule.
pub fn round_decimal(amount: Decimal, rule: RoundingRule) -> Decimal {
    amount.round_dp_with_strategy(0, rule.strategy())
}

/// Round a float amount by converting through the decimal path.
///
/// Non-finite inputs are returned unchanged.
pub fn round_f64(amount: f64, rule: RoundingRule) -> f64 {
    match Decimal::from_f64_retain(amount) {
        Some(decimal) => round_decimal(decimal, rule).to_f64().unwrap_or(amount),
        None => amount,
    }
}

/// Round a decimal currency amount to integer minor units.
///
/// Saturates at the `i64` range.
pub fn to_currency_unit(amount: Decimal, rule: RoundingRule) -> i64 {
    let rounded = round_decimal(amount, rule);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}
