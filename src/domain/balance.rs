//! Balance series aggregation across the Actual and If scenarios.
//!
//! All bucketing uses the proleptic Gregorian calendar of `NaiveDate`, so
//! results are identical regardless of the environment's time zone. Daily,
//! monthly, and yearly series are one algorithm parameterized by
//! [`GroupingUnit`].

use chrono::{Datelike, Months, NaiveDate};
use std::collections::HashMap;

use super::profile::Profile;
use super::race::Race;
use super::ticket::TicketKind;

/// Time bucket width for series computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingUnit {
    Day,
    Month,
    Year,
}

impl GroupingUnit {
    /// Truncate a date to the start of its bucket.
    pub fn normalize(self, date: NaiveDate) -> NaiveDate {
        match self {
            GroupingUnit::Day => date,
            GroupingUnit::Month => {
                NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
            }
            GroupingUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// Advance a bucket start by one unit with calendar-correct arithmetic.
    ///
    /// `None` only at the edge of the representable date range; the series
    /// walk stops there rather than looping or panicking.
    pub fn increment(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            GroupingUnit::Day => date.succ_opt(),
            GroupingUnit::Month => date.checked_add_months(Months::new(1)),
            GroupingUnit::Year => date.checked_add_months(Months::new(12)),
        }
    }
}

/// One point per time bucket. Balances and totals are running values
/// carried forward across buckets with no activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSeriesPoint {
    pub date: NaiveDate,
    pub actual_balance: i64,
    /// Actual plus If: the hypothetical overlay on top of what actually
    /// happened, not a replacement of it.
    pub combined_balance: i64,
    pub actual_profit: i64,
    pub combined_profit: i64,
    pub actual_stake_total: i64,
    pub actual_payout_total: i64,
    pub if_stake_total: i64,
    pub if_payout_total: i64,
}

/// Final balances from the daily series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSummary {
    pub final_actual: i64,
    pub final_combined: i64,
}

#[derive(Debug, Default)]
struct AggregatedChange {
    actual_net: i64,
    if_net: i64,
    actual_stake: i64,
    actual_payout: i64,
    if_stake: i64,
    if_payout: i64,
}

/// Daily balance series.
pub fn daily_series(races: &[Race], profile: &Profile) -> Vec<BalanceSeriesPoint> {
    compute_series(GroupingUnit::Day, races, profile)
}

/// Monthly balance series; bucket dates are the first of each month.
pub fn monthly_series(races: &[Race], profile: &Profile) -> Vec<BalanceSeriesPoint> {
    compute_series(GroupingUnit::Month, races, profile)
}

/// Yearly balance series; bucket dates are January 1.
pub fn yearly_series(races: &[Race], profile: &Profile) -> Vec<BalanceSeriesPoint> {
    compute_series(GroupingUnit::Year, races, profile)
}

/// Compute a gapless, ordered series at the requested granularity.
///
/// With no contributing tickets at all, emits exactly one point anchored at
/// the profile's creation timestamp (normalized), holding the initial
/// balance with zero movement.
pub fn compute_series(
    unit: GroupingUnit,
    races: &[Race],
    profile: &Profile,
) -> Vec<BalanceSeriesPoint> {
    let changes = aggregate_changes(unit, races);
    let initial = profile.initial_balance;

    let Some((start, end)) = determine_range(&changes) else {
        let anchor = unit.normalize(profile.created_at.date_naive());
        return vec![BalanceSeriesPoint {
            date: anchor,
            actual_balance: initial,
            combined_balance: initial,
            actual_profit: 0,
            combined_profit: 0,
            actual_stake_total: 0,
            actual_payout_total: 0,
            if_stake_total: 0,
            if_payout_total: 0,
        }];
    };

    let mut points = Vec::with_capacity(changes.len() + 1);
    let mut actual_net = 0i64;
    let mut if_net = 0i64;
    let mut actual_stake = 0i64;
    let mut actual_payout = 0i64;
    let mut if_stake = 0i64;
    let mut if_payout = 0i64;

    let mut current = start;
    while current <= end {
        if let Some(delta) = changes.get(&current) {
            actual_net += delta.actual_net;
            if_net += delta.if_net;
            actual_stake += delta.actual_stake;
            actual_payout += delta.actual_payout;
            if_stake += delta.if_stake;
            if_payout += delta.if_payout;
        }
        points.push(BalanceSeriesPoint {
            date: current,
            actual_balance: initial + actual_net,
            combined_balance: initial + actual_net + if_net,
            actual_profit: actual_net,
            combined_profit: actual_net + if_net,
            actual_stake_total: actual_stake,
            actual_payout_total: actual_payout,
            if_stake_total: if_stake,
            if_payout_total: if_payout,
        });

        let Some(next) = unit.increment(current) else {
            break;
        };
        current = next;
    }

    points
}

/// Final Actual and combined balances.
///
/// Falls back to the profile's initial balance when no points exist, and to
/// `default_initial` for both scenarios when no profile exists at all.
pub fn summarize(
    races: &[Race],
    profile: Option<&Profile>,
    default_initial: i64,
) -> BalanceSummary {
    let Some(profile) = profile else {
        return BalanceSummary {
            final_actual: default_initial,
            final_combined: default_initial,
        };
    };
    let daily = daily_series(races, profile);
    match daily.last() {
        Some(last) => BalanceSummary {
            final_actual: last.actual_balance,
            final_combined: last.combined_balance,
        },
        None => BalanceSummary {
            final_actual: profile.initial_balance,
            final_combined: profile.initial_balance,
        },
    }
}

fn aggregate_changes(unit: GroupingUnit, races: &[Race]) -> HashMap<NaiveDate, AggregatedChange> {
    let mut changes: HashMap<NaiveDate, AggregatedChange> = HashMap::new();

    for race in races {
        let bucket = unit.normalize(race.date);
        let mut delta = AggregatedChange::default();
        let mut contributed = false;

        for ticket in &race.tickets {
            let net = ticket.net();
            match TicketKind::from_raw(ticket.kind) {
                Some(TicketKind::Actual) => {
                    delta.actual_net += net;
                    delta.actual_stake += ticket.stake;
                    delta.actual_payout += ticket.payout.unwrap_or(0);
                    contributed = true;
                }
                Some(TicketKind::If) => {
                    delta.if_net += net;
                    delta.if_stake += ticket.stake;
                    delta.if_payout += ticket.payout.unwrap_or(0);
                    contributed = true;
                }
                // Unrecognized kinds contribute nothing.
                None => continue,
            }
        }

        if contributed {
            let entry = changes.entry(bucket).or_default();
            entry.actual_net += delta.actual_net;
            entry.if_net += delta.if_net;
            entry.actual_stake += delta.actual_stake;
            entry.actual_payout += delta.actual_payout;
            entry.if_stake += delta.if_stake;
            entry.if_payout += delta.if_payout;
        }
    }

    changes
}

fn determine_range(
    changes: &HashMap<NaiveDate, AggregatedChange>,
) -> Option<(NaiveDate, NaiveDate)> {
    let start = changes.keys().min().copied()?;
    let end = changes.keys().max().copied()?;
    Some((start, end))
}
