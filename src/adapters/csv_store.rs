//! CSV file store adapter.
//!
//! Reads `profile.csv`, `races.csv`, and `tickets.csv` from a data
//! directory, in the same schema the exporter writes, so an exported
//! snapshot can be read back as a store. Missing files mean an empty store
//! (or an absent profile), not an error; malformed rows are errors.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::error::KeibalogError;
use crate::domain::profile::Profile;
use crate::domain::race::Race;
use crate::domain::ticket::Ticket;
use crate::ports::store_port::StorePort;

pub struct CsvStore {
    base_path: PathBuf,
}

impl CsvStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn read_optional(&self, file: &str) -> Result<Option<String>, KeibalogError> {
        match fs::read_to_string(self.base_path.join(file)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KeibalogError::Store {
                reason: format!("failed to read {file}: {e}"),
            }),
        }
    }

    fn read_tickets(&self) -> Result<Vec<Ticket>, KeibalogError> {
        let Some(content) = self.read_optional("tickets.csv")? else {
            return Ok(Vec::new());
        };

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut tickets = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| KeibalogError::Store {
                reason: format!("tickets.csv parse error: {e}"),
            })?;
            tickets.push(ticket_from_record(&record)?);
        }
        Ok(tickets)
    }
}

impl StorePort for CsvStore {
    fn fetch_profile(&self) -> Result<Option<Profile>, KeibalogError> {
        let Some(content) = self.read_optional("profile.csv")? else {
            return Ok(None);
        };

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        match reader.records().next() {
            Some(result) => {
                let record = result.map_err(|e| KeibalogError::Store {
                    reason: format!("profile.csv parse error: {e}"),
                })?;
                Ok(Some(profile_from_record(&record)?))
            }
            None => Ok(None),
        }
    }

    fn list_races(&self) -> Result<Vec<Race>, KeibalogError> {
        let Some(content) = self.read_optional("races.csv")? else {
            return Ok(Vec::new());
        };

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut races = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| KeibalogError::Store {
                reason: format!("races.csv parse error: {e}"),
            })?;
            races.push(race_from_record(&record)?);
        }

        // Tickets with no matching race stay unattached; they are still
        // visible through list_tickets.
        for ticket in self.read_tickets()? {
            if let Some(race_id) = ticket.race_id {
                if let Some(race) = races.iter_mut().find(|r| r.id == race_id) {
                    race.tickets.push(ticket);
                }
            }
        }

        Ok(races)
    }

    fn list_tickets(&self) -> Result<Vec<Ticket>, KeibalogError> {
        self.read_tickets()
    }
}

fn store_err(reason: String) -> KeibalogError {
    KeibalogError::Store { reason }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    file: &str,
    name: &str,
) -> Result<&'r str, KeibalogError> {
    record
        .get(idx)
        .ok_or_else(|| store_err(format!("{file}: missing {name} column")))
}

fn parse_uuid(value: &str, context: &str) -> Result<Uuid, KeibalogError> {
    Uuid::parse_str(value).map_err(|e| store_err(format!("invalid {context} '{value}': {e}")))
}

fn parse_opt_uuid(value: &str, context: &str) -> Result<Option<Uuid>, KeibalogError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_uuid(value, context).map(Some)
}

fn parse_i64(value: &str, context: &str) -> Result<i64, KeibalogError> {
    value
        .parse()
        .map_err(|e| store_err(format!("invalid {context} '{value}': {e}")))
}

fn parse_i16(value: &str, context: &str) -> Result<i16, KeibalogError> {
    value
        .parse()
        .map_err(|e| store_err(format!("invalid {context} '{value}': {e}")))
}

fn parse_timestamp(value: &str, context: &str) -> Result<DateTime<Utc>, KeibalogError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| store_err(format!("invalid {context} '{value}': {e}")))
}

/// Race dates accept both the exporter's midnight-UTC timestamp form and a
/// bare `YYYY-MM-DD` for hand-authored files.
fn parse_race_date(value: &str) -> Result<NaiveDate, KeibalogError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| store_err(format!("invalid race date '{value}': {e}")))
}

fn race_from_record(record: &csv::StringRecord) -> Result<Race, KeibalogError> {
    let file = "races.csv";
    let name = field(record, 2, file, "name")?;
    let memo = field(record, 3, file, "memo")?;
    Ok(Race {
        id: parse_uuid(field(record, 0, file, "raceId")?, "raceId")?,
        date: parse_race_date(field(record, 1, file, "date")?)?,
        name: (!name.is_empty()).then(|| name.to_string()),
        memo: (!memo.is_empty()).then(|| memo.to_string()),
        tickets: Vec::new(),
        created_at: parse_timestamp(field(record, 4, file, "createdAt")?, "createdAt")?,
        updated_at: parse_timestamp(field(record, 5, file, "updatedAt")?, "updatedAt")?,
    })
}

fn ticket_from_record(record: &csv::StringRecord) -> Result<Ticket, KeibalogError> {
    let file = "tickets.csv";
    let payout = field(record, 5, file, "payout")?;
    let odds = field(record, 6, file, "odds")?;
    Ok(Ticket {
        id: parse_uuid(field(record, 0, file, "ticketId")?, "ticketId")?,
        race_id: parse_opt_uuid(field(record, 1, file, "raceId")?, "raceId")?,
        kind: parse_i16(field(record, 2, file, "kind")?, "kind")?,
        bet_type: parse_i16(field(record, 3, file, "betType")?, "betType")?,
        stake: parse_i64(field(record, 4, file, "stake")?, "stake")?,
        payout: if payout.is_empty() {
            None
        } else {
            Some(parse_i64(payout, "payout")?)
        },
        odds: if odds.is_empty() {
            None
        } else {
            Some(
                Decimal::from_str(odds)
                    .map_err(|e| store_err(format!("invalid odds '{odds}': {e}")))?,
            )
        },
        linked_actual_id: parse_opt_uuid(field(record, 7, file, "linkedActualId")?, "linkedActualId")?,
        selections_json: field(record, 8, file, "selectionsJson")?.to_string(),
        created_at: parse_timestamp(field(record, 9, file, "createdAt")?, "createdAt")?,
        updated_at: parse_timestamp(field(record, 10, file, "updatedAt")?, "updatedAt")?,
    })
}

fn profile_from_record(record: &csv::StringRecord) -> Result<Profile, KeibalogError> {
    let file = "profile.csv";
    let payday = field(record, 2, file, "payday")?;
    Ok(Profile {
        id: parse_uuid(field(record, 0, file, "profileId")?, "profileId")?,
        initial_balance: parse_i64(field(record, 1, file, "initialBalance")?, "initialBalance")?,
        payday: if payday.is_empty() {
            None
        } else {
            Some(
                payday
                    .parse()
                    .map_err(|e| store_err(format!("invalid payday '{payday}': {e}")))?,
            )
        },
        monthly_free_budget: parse_i64(
            field(record, 3, file, "monthlyFreeBudget")?,
            "monthlyFreeBudget",
        )?,
        odds_mode: parse_i16(field(record, 4, file, "oddsMode")?, "oddsMode")?,
        rounding_rule: parse_i16(field(record, 5, file, "roundingRule")?, "roundingRule")?,
        created_at: parse_timestamp(field(record, 6, file, "createdAt")?, "createdAt")?,
        updated_at: parse_timestamp(field(record, 7, file, "updatedAt")?, "updatedAt")?,
    })
}

/// Header for the store-side profile file (not part of the export pair).
pub const PROFILE_HEADER: &str =
    "profileId,initialBalance,payday,monthlyFreeBudget,oddsMode,roundingRule,createdAt,updatedAt";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) {
        let mut f = fs::File::create(dir.path().join(name)).unwrap();
        write!(f, "{content}").unwrap();
    }

    fn setup_store(dir: &TempDir) -> CsvStore {
        CsvStore::new(dir.path().to_path_buf())
    }

    const RACE_ID: &str = "11111111-1111-1111-1111-111111111111";
    const OTHER_RACE_ID: &str = "22222222-2222-2222-2222-222222222222";

    fn races_csv() -> String {
        format!(
            "raceId,date,name,memo,createdAt,updatedAt\n\
             {RACE_ID},2024-03-01T00:00:00.000Z,Nakayama 11R,,2024-03-01T09:00:00.000Z,2024-03-01T09:00:00.000Z\n"
        )
    }

    fn tickets_csv() -> String {
        format!(
            "ticketId,raceId,kind,betType,stake,payout,odds,linkedActualId,selectionsJson,createdAt,updatedAt\n\
             33333333-3333-3333-3333-333333333333,{RACE_ID},0,0,1000,3000,3.20,,[],2024-03-01T09:05:00.000Z,2024-03-01T09:05:00.000Z\n\
             44444444-4444-4444-4444-444444444444,{OTHER_RACE_ID},1,0,2000,,,,[],2024-03-01T09:06:00.000Z,2024-03-01T09:06:00.000Z\n"
        )
    }

    #[test]
    fn missing_files_mean_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = setup_store(&dir);
        assert_eq!(store.fetch_profile().unwrap(), None);
        assert!(store.list_races().unwrap().is_empty());
        assert!(store.list_tickets().unwrap().is_empty());
    }

    #[test]
    fn header_only_profile_is_absent() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "profile.csv", &format!("{PROFILE_HEADER}\n"));
        assert_eq!(setup_store(&dir).fetch_profile().unwrap(), None);
    }

    #[test]
    fn fetch_profile_parses_row() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "profile.csv",
            &format!(
                "{PROFILE_HEADER}\n\
                 55555555-5555-5555-5555-555555555555,100000,25,30000,0,1,2024-01-01T00:00:00.000Z,2024-01-02T00:00:00.000Z\n"
            ),
        );
        let profile = setup_store(&dir).fetch_profile().unwrap().unwrap();
        assert_eq!(profile.initial_balance, 100_000);
        assert_eq!(profile.payday, Some(25));
        assert_eq!(profile.monthly_free_budget, 30_000);
        assert_eq!(profile.rounding_rule, 1);
    }

    #[test]
    fn list_races_attaches_tickets_by_race_id() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "races.csv", &races_csv());
        write_file(&dir, "tickets.csv", &tickets_csv());

        let races = setup_store(&dir).list_races().unwrap();
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].name.as_deref(), Some("Nakayama 11R"));
        assert_eq!(races[0].memo, None);
        // The orphan (unknown race id) is not attached.
        assert_eq!(races[0].tickets.len(), 1);
        assert_eq!(races[0].tickets[0].stake, 1000);
        assert_eq!(races[0].tickets[0].payout, Some(3000));
        assert_eq!(races[0].tickets[0].odds.unwrap().to_string(), "3.20");
    }

    #[test]
    fn list_tickets_includes_orphans() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "races.csv", &races_csv());
        write_file(&dir, "tickets.csv", &tickets_csv());

        let tickets = setup_store(&dir).list_tickets().unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[1].payout, None);
        assert_eq!(tickets[1].odds, None);
    }

    #[test]
    fn bare_date_form_is_accepted() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "races.csv",
            &format!(
                "raceId,date,name,memo,createdAt,updatedAt\n\
                 {RACE_ID},2024-03-01,,,2024-03-01T09:00:00.000Z,2024-03-01T09:00:00.000Z\n"
            ),
        );
        let races = setup_store(&dir).list_races().unwrap();
        assert_eq!(
            races[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(races[0].name, None);
    }

    #[test]
    fn malformed_row_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "races.csv",
            "raceId,date,name,memo,createdAt,updatedAt\n\
             not-a-uuid,2024-03-01,,,2024-03-01T09:00:00.000Z,2024-03-01T09:00:00.000Z\n",
        );
        assert!(setup_store(&dir).list_races().is_err());
    }
}
