//! Race entity.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::ticket::Ticket;

/// A race day entry owning its tickets. Deleting a race deletes all of its
/// tickets.
///
/// `date` is a plain calendar date used only for bucketing, independent of
/// the time zone the entry was made in.
#[derive(Debug, Clone, PartialEq)]
pub struct Race {
    pub id: Uuid,
    pub date: NaiveDate,
    pub name: Option<String>,
    pub memo: Option<String>,
    pub tickets: Vec<Ticket>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Race {
    pub fn new(
        date: NaiveDate,
        name: Option<String>,
        memo: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Race {
            id: Uuid::new_v4(),
            date,
            name,
            memo,
            tickets: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_race_has_no_tickets() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let race = Race::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            Some("Nakayama 11R".to_string()),
            None,
            now,
        );
        assert!(race.tickets.is_empty());
        assert_eq!(race.name.as_deref(), Some("Nakayama 11R"));
        assert_eq!(race.memo, None);
        assert_eq!(race.created_at, race.updated_at);
    }
}
