//! Ticket entity and its discriminators.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Scenario discriminator, stored as a raw `i16` on the ticket.
///
/// Raw values outside the known set are preserved on the ticket and skipped
/// by the aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketKind {
    Actual,
    If,
}

impl TicketKind {
    pub fn from_raw(raw: i16) -> Option<Self> {
        match raw {
            0 => Some(TicketKind::Actual),
            1 => Some(TicketKind::If),
            _ => None,
        }
    }

    pub fn raw(self) -> i16 {
        match self {
            TicketKind::Actual => 0,
            TicketKind::If => 1,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TicketKind::Actual => "Actual",
            TicketKind::If => "If",
        }
    }
}

/// Bet type, stored as a raw `i16` on the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetType {
    Win,
    Place,
    Quinella,
    Exacta,
    Trifecta,
}

impl BetType {
    pub fn from_raw(raw: i16) -> Option<Self> {
        match raw {
            0 => Some(BetType::Win),
            1 => Some(BetType::Place),
            2 => Some(BetType::Quinella),
            3 => Some(BetType::Exacta),
            4 => Some(BetType::Trifecta),
            _ => None,
        }
    }

    pub fn raw(self) -> i16 {
        match self {
            BetType::Win => 0,
            BetType::Place => 1,
            BetType::Quinella => 2,
            BetType::Exacta => 3,
            BetType::Trifecta => 4,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BetType::Win => "Win",
            BetType::Place => "Place",
            BetType::Quinella => "Quinella",
            BetType::Exacta => "Exacta",
            BetType::Trifecta => "Trifecta",
        }
    }
}

/// A single bet. Owned by its race; `race_id` is a weak back-reference for
/// lookup only and may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: Uuid,
    pub race_id: Option<Uuid>,
    pub kind: i16,
    pub bet_type: i16,
    pub selections_json: String,
    /// Stake in minor currency units.
    pub stake: i64,
    /// Payout in minor currency units, present once a result is known.
    pub payout: Option<i64>,
    pub odds: Option<Decimal>,
    /// When this If ticket was derived from an Actual ticket, that ticket's
    /// id. Informational only, never enforced as a foreign key.
    pub linked_actual_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(
        race_id: Option<Uuid>,
        kind: i16,
        bet_type: i16,
        selections_json: impl Into<String>,
        stake: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Ticket {
            id: Uuid::new_v4(),
            race_id,
            kind,
            bet_type,
            selections_json: selections_json.into(),
            stake,
            payout: None,
            odds: None,
            linked_actual_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Payout minus stake; a missing payout counts as zero.
    pub fn net(&self) -> i64 {
        self.payout.unwrap_or(0) - self.stake
    }
}
