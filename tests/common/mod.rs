#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use keibalog::domain::error::KeibalogError;
use keibalog::domain::profile::Profile;
use keibalog::domain::race::Race;
use keibalog::domain::ticket::Ticket;
use keibalog::ports::store_port::StorePort;

pub struct MockStore {
    pub profile: Option<Profile>,
    pub races: Vec<Race>,
    pub orphan_tickets: Vec<Ticket>,
    pub error: Option<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            profile: None,
            races: Vec::new(),
            orphan_tickets: Vec::new(),
            error: None,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_races(mut self, races: Vec<Race>) -> Self {
        self.races = races;
        self
    }

    pub fn with_orphan(mut self, ticket: Ticket) -> Self {
        self.orphan_tickets.push(ticket);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn check_error(&self) -> Result<(), KeibalogError> {
        match &self.error {
            Some(reason) => Err(KeibalogError::Store {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl StorePort for MockStore {
    fn fetch_profile(&self) -> Result<Option<Profile>, KeibalogError> {
        self.check_error()?;
        Ok(self.profile.clone())
    }

    fn list_races(&self) -> Result<Vec<Race>, KeibalogError> {
        self.check_error()?;
        Ok(self.races.clone())
    }

    fn list_tickets(&self) -> Result<Vec<Ticket>, KeibalogError> {
        self.check_error()?;
        let mut tickets: Vec<Ticket> = self
            .races
            .iter()
            .flat_map(|r| r.tickets.clone())
            .collect();
        tickets.extend(self.orphan_tickets.clone());
        Ok(tickets)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn make_profile(initial: i64) -> Profile {
    Profile::new(initial, ts(2024, 1, 1, 0, 0, 0))
}

pub fn race_on(d: NaiveDate) -> Race {
    Race::new(d, None, None, ts(2024, 1, 1, 9, 0, 0))
}

pub fn make_ticket(race_id: Option<uuid::Uuid>, kind: i16, stake: i64, payout: Option<i64>) -> Ticket {
    let mut ticket = Ticket::new(race_id, kind, 0, "[]", stake, ts(2024, 1, 1, 9, 0, 0));
    ticket.payout = payout;
    ticket
}

/// A race on `d` carrying one ticket per (kind, stake, payout) triple.
pub fn race_with_tickets(d: NaiveDate, tickets: &[(i16, i64, Option<i64>)]) -> Race {
    let mut race = race_on(d);
    for &(kind, stake, payout) in tickets {
        race.tickets.push(make_ticket(Some(race.id), kind, stake, payout));
    }
    race
}
