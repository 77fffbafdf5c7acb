//! CSV export adapter.
//!
//! Output contract: fixed headers, rows sorted ascending (races by date,
//! createdAt, id; tickets by createdAt, id), timestamps in ISO-8601 UTC
//! with millisecond precision, optional fields as empty strings, RFC 4180
//! quoting, and a trailing newline. Zero rows produce a header-only file.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::Path;

use crate::domain::error::KeibalogError;
use crate::domain::race::Race;
use crate::domain::ticket::Ticket;
use crate::ports::export_port::{ExportPort, ExportedFiles};

const RACES_HEADER: [&str; 6] = ["raceId", "date", "name", "memo", "createdAt", "updatedAt"];
const TICKETS_HEADER: [&str; 11] = [
    "ticketId",
    "raceId",
    "kind",
    "betType",
    "stake",
    "payout",
    "odds",
    "linkedActualId",
    "selectionsJson",
    "createdAt",
    "updatedAt",
];

pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn export_races(&self, races: &[Race]) -> Result<String, KeibalogError> {
        let mut sorted: Vec<&Race> = races.iter().collect();
        sorted.sort_by_key(|r| (r.date, r.created_at, r.id));

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(RACES_HEADER).map_err(csv_error)?;

        for race in sorted {
            writer
                .write_record([
                    race.id.to_string(),
                    race.date.format("%Y-%m-%dT00:00:00.000Z").to_string(),
                    race.name.clone().unwrap_or_default(),
                    race.memo.clone().unwrap_or_default(),
                    iso8601(&race.created_at),
                    iso8601(&race.updated_at),
                ])
                .map_err(csv_error)?;
        }

        finish(writer)
    }

    pub fn export_tickets(&self, tickets: &[Ticket]) -> Result<String, KeibalogError> {
        let mut sorted: Vec<&Ticket> = tickets.iter().collect();
        sorted.sort_by_key(|t| (t.created_at, t.id));

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(TICKETS_HEADER).map_err(csv_error)?;

        for ticket in sorted {
            writer
                .write_record([
                    ticket.id.to_string(),
                    ticket.race_id.map(|id| id.to_string()).unwrap_or_default(),
                    ticket.kind.to_string(),
                    ticket.bet_type.to_string(),
                    ticket.stake.to_string(),
                    ticket.payout.map(|p| p.to_string()).unwrap_or_default(),
                    ticket
                        .odds
                        .map(|o| format!("{:.2}", o))
                        .unwrap_or_default(),
                    ticket
                        .linked_actual_id
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                    ticket.selections_json.clone(),
                    iso8601(&ticket.created_at),
                    iso8601(&ticket.updated_at),
                ])
                .map_err(csv_error)?;
        }

        finish(writer)
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportPort for CsvExporter {
    fn write_files(
        &self,
        races: &[Race],
        tickets: &[Ticket],
        out_dir: &Path,
        now: DateTime<Utc>,
    ) -> Result<ExportedFiles, KeibalogError> {
        let races_csv = self.export_races(races)?;
        let tickets_csv = self.export_tickets(tickets)?;

        fs::create_dir_all(out_dir)?;
        let timestamp = now.format("%Y%m%d-%H%M%S");
        let races_path = out_dir.join(format!("races-{timestamp}.csv"));
        let tickets_path = out_dir.join(format!("tickets-{timestamp}.csv"));

        fs::write(&races_path, races_csv)?;
        fs::write(&tickets_path, tickets_csv)?;

        Ok(ExportedFiles {
            races_path,
            tickets_path,
        })
    }
}

fn iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn csv_error(e: csv::Error) -> KeibalogError {
    KeibalogError::Export {
        reason: e.to_string(),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, KeibalogError> {
    let bytes = writer.into_inner().map_err(|e| KeibalogError::Export {
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| KeibalogError::Export {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_export_is_header_only_with_trailing_newline() {
        let exporter = CsvExporter::new();
        assert_eq!(
            exporter.export_races(&[]).unwrap(),
            "raceId,date,name,memo,createdAt,updatedAt\n"
        );
        let tickets_csv = exporter.export_tickets(&[]).unwrap();
        assert!(tickets_csv.starts_with("ticketId,raceId,kind,betType,stake,payout,odds,"));
        assert!(tickets_csv.ends_with("\n"));
        assert_eq!(tickets_csv.lines().count(), 1);
    }

    #[test]
    fn races_sorted_by_date_then_created_then_id() {
        let mut early = Race::new(date(2024, 1, 10), None, None, ts(12, 0, 0));
        early.name = Some("early".into());
        let mut late = Race::new(date(2024, 1, 20), None, None, ts(9, 0, 0));
        late.name = Some("late".into());
        let mut tiebreak = Race::new(date(2024, 1, 10), None, None, ts(8, 0, 0));
        tiebreak.name = Some("tiebreak".into());

        let csv = CsvExporter::new()
            .export_races(&[late.clone(), early.clone(), tiebreak.clone()])
            .unwrap();
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains("tiebreak"));
        assert!(rows[1].contains("early"));
        assert!(rows[2].contains("late"));
    }

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        let mut race = Race::new(date(2024, 1, 10), None, None, ts(12, 0, 0));
        race.name = Some("G1, \"Arima\" Kinen".into());

        let csv = CsvExporter::new().export_races(&[race]).unwrap();
        assert!(csv.contains("\"G1, \"\"Arima\"\" Kinen\""));
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        let mut race = Race::new(date(2024, 1, 10), None, None, ts(12, 0, 0));
        race.name = Some("Nakayama 11R".into());

        let csv = CsvExporter::new().export_races(&[race]).unwrap();
        assert!(csv.contains(",Nakayama 11R,"));
    }

    #[test]
    fn timestamps_use_utc_millis_format() {
        let race = Race::new(date(2024, 1, 10), None, None, ts(12, 34, 56));
        let csv = CsvExporter::new().export_races(&[race]).unwrap();
        assert!(csv.contains("2024-01-10T00:00:00.000Z"));
        assert!(csv.contains("2024-01-15T12:34:56.000Z"));
    }

    #[test]
    fn optional_ticket_fields_render_empty() {
        let ticket = Ticket::new(None, 0, 2, "[]", 1000, ts(10, 0, 0));
        let csv = CsvExporter::new().export_tickets(&[ticket.clone()]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(&format!("{},,0,2,1000,,,,[]", ticket.id)));
    }

    #[test]
    fn odds_render_with_two_decimals() {
        let mut ticket = Ticket::new(None, 0, 0, "[]", 1000, ts(10, 0, 0));
        ticket.odds = Some(dec!(3.2));
        let csv = CsvExporter::new().export_tickets(&[ticket]).unwrap();
        assert!(csv.contains(",3.20,"));
    }

    #[test]
    fn tickets_sorted_by_created_then_id() {
        let older = Ticket::new(None, 0, 0, "older", 100, ts(8, 0, 0));
        let newer = Ticket::new(None, 0, 0, "newer", 200, ts(9, 0, 0));
        let csv = CsvExporter::new()
            .export_tickets(&[newer.clone(), older.clone()])
            .unwrap();
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert!(rows[0].contains("older"));
        assert!(rows[1].contains("newer"));
    }

    #[test]
    fn write_files_creates_timestamped_pair() {
        let dir = TempDir::new().unwrap();
        let exported = CsvExporter::new()
            .write_files(&[], &[], dir.path(), ts(12, 34, 56))
            .unwrap();

        assert_eq!(
            exported.races_path.file_name().unwrap(),
            "races-20240115-123456.csv"
        );
        assert_eq!(
            exported.tickets_path.file_name().unwrap(),
            "tickets-20240115-123456.csv"
        );
        let content = fs::read_to_string(&exported.races_path).unwrap();
        assert_eq!(content, "raceId,date,name,memo,createdAt,updatedAt\n");
    }
}
