//! Change-detection signature over a profile/races snapshot.
//!
//! The engine is pure; presentation callers re-invoke it when the snapshot
//! changes. Comparing two signatures answers "did anything the series
//! depends on change" without hashing full entities.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::profile::Profile;
use super::race::Race;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TicketSignature {
    id: Uuid,
    kind: i16,
    stake: i64,
    payout: Option<i64>,
    odds: Option<Decimal>,
    linked_actual_id: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RaceSignature {
    id: Uuid,
    date: NaiveDate,
    updated_at: DateTime<Utc>,
    tickets: Vec<TicketSignature>,
}

/// Lightweight equality signature for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSignature {
    profile_id: Option<Uuid>,
    profile_initial_balance: Option<i64>,
    profile_updated_at: Option<DateTime<Utc>>,
    profile_monthly_free_budget: Option<i64>,
    profile_payday: Option<u32>,
    profile_odds_mode: Option<i16>,
    profile_rounding_rule: Option<i16>,
    races: Vec<RaceSignature>,
}

impl SnapshotSignature {
    /// Build a signature; races are ordered by (date, id) and tickets by id
    /// so input ordering never causes a spurious mismatch.
    pub fn new(profile: Option<&Profile>, races: &[Race]) -> Self {
        let mut race_signatures: Vec<RaceSignature> = races
            .iter()
            .map(|race| {
                let mut tickets: Vec<TicketSignature> = race
                    .tickets
                    .iter()
                    .map(|ticket| TicketSignature {
                        id: ticket.id,
                        kind: ticket.kind,
                        stake: ticket.stake,
                        payout: ticket.payout,
                        odds: ticket.odds,
                        linked_actual_id: ticket.linked_actual_id,
                        updated_at: ticket.updated_at,
                    })
                    .collect();
                tickets.sort_by_key(|t| t.id);
                RaceSignature {
                    id: race.id,
                    date: race.date,
                    updated_at: race.updated_at,
                    tickets,
                }
            })
            .collect();
        race_signatures.sort_by_key(|r| (r.date, r.id));

        SnapshotSignature {
            profile_id: profile.map(|p| p.id),
            profile_initial_balance: profile.map(|p| p.initial_balance),
            profile_updated_at: profile.map(|p| p.updated_at),
            profile_monthly_free_budget: profile.map(|p| p.monthly_free_budget),
            profile_payday: profile.and_then(|p| p.payday),
            profile_odds_mode: profile.map(|p| p.odds_mode),
            profile_rounding_rule: profile.map(|p| p.rounding_rule),
            races: race_signatures,
        }
    }
}
