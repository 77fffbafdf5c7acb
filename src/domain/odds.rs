//! Odds-derived calculations for building increased If tickets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::rounding::{self, RoundingRule};
use super::ticket::{Ticket, TicketKind};

/// Preview of an If ticket mirroring an Actual ticket at an increased stake.
#[derive(Debug, Clone, PartialEq)]
pub struct IncreasedIf {
    /// Base stake plus the applied delta, in minor currency units.
    pub stake: i64,
    /// Projected payout at the preserved win ratio; `None` when no ratio is
    /// derivable from the base ticket.
    pub payout: Option<i64>,
    /// The ratio the projection used.
    pub ratio: Option<Decimal>,
    /// The delta actually applied, after clamping negatives to zero.
    pub applied_delta: i64,
}

/// Derive the implied win ratio from an Actual ticket's figures.
///
/// A realized payout is authoritative over quoted odds. No ratio is
/// derivable from a non-positive stake, or when neither payout nor positive
/// odds are present.
pub fn increase_ratio(stake: i64, payout: Option<i64>, odds: Option<Decimal>) -> Option<Decimal> {
    if stake <= 0 {
        return None;
    }
    if let Some(payout) = payout {
        return Some(Decimal::from(payout) / Decimal::from(stake));
    }
    odds.filter(|o| o.is_sign_positive() && !o.is_zero())
}

/// Compute the increased-If preview for a base ticket's figures.
///
/// Returns `None` when the base stake is not positive. A negative
/// `delta_stake` is treated as zero increase.
pub fn increased_if(
    base_stake: i64,
    base_payout: Option<i64>,
    base_odds: Option<Decimal>,
    delta_stake: i64,
    rule: RoundingRule,
) -> Option<IncreasedIf> {
    if base_stake <= 0 {
        return None;
    }
    let applied_delta = delta_stake.max(0);
    let stake = base_stake + applied_delta;
    let ratio = increase_ratio(base_stake, base_payout, base_odds);
    let payout = ratio.map(|r| rounding::to_currency_unit(Decimal::from(stake) * r, rule));
    Some(IncreasedIf {
        stake,
        payout,
        ratio,
        applied_delta,
    })
}

/// Instantiate an If ticket derived from an Actual ticket.
///
/// Explicit odds on the base are carried unchanged; otherwise a ratio
/// derived from the base's payout becomes the new ticket's odds. The new
/// ticket always links back to the base via `linked_actual_id`.
pub fn build_if_ticket(
    base: &Ticket,
    delta_stake: i64,
    rule: RoundingRule,
    now: DateTime<Utc>,
) -> Option<Ticket> {
    let preview = increased_if(base.stake, base.payout, base.odds, delta_stake, rule)?;
    let mut ticket = Ticket::new(
        base.race_id,
        TicketKind::If.raw(),
        base.bet_type,
        base.selections_json.clone(),
        preview.stake,
        now,
    );
    ticket.payout = preview.payout;
    ticket.odds = base.odds.or(preview.ratio);
    ticket.linked_actual_id = Some(base.id);
    Some(ticket)
}

/// Return rate as payout over stake.
///
/// Undefined (rather than zero) when the stake is zero.
pub fn return_rate(stake: i64, payout: i64) -> Option<Decimal> {
    if stake == 0 {
        return None;
    }
    Some(Decimal::from(payout) / Decimal::from(stake))
}
