//! SQLite store adapter.
//!
//! Race→Ticket ownership is enforced in the schema: tickets cascade-delete
//! with their race. Connections enable `foreign_keys` on checkout.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rust_decimal::Decimal;
use rusqlite::params;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::error::KeibalogError;
use crate::domain::profile::Profile;
use crate::domain::race::Race;
use crate::domain::ticket::Ticket;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

impl SqliteStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, KeibalogError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| KeibalogError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;
        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path)
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| KeibalogError::Store {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, KeibalogError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| KeibalogError::Store {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConn, KeibalogError> {
        self.pool.get().map_err(|e: r2d2::Error| KeibalogError::Store {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), KeibalogError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                initial_balance INTEGER NOT NULL,
                payday INTEGER,
                monthly_free_budget INTEGER NOT NULL,
                odds_mode INTEGER NOT NULL,
                rounding_rule INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS races (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                name TEXT,
                memo TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                race_id TEXT REFERENCES races(id) ON DELETE CASCADE,
                kind INTEGER NOT NULL,
                bet_type INTEGER NOT NULL,
                selections_json TEXT NOT NULL,
                stake INTEGER NOT NULL,
                payout INTEGER,
                odds TEXT,
                linked_actual_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tickets_race_id ON tickets(race_id);
            CREATE INDEX IF NOT EXISTS idx_races_date ON races(date);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    /// Insert or replace the single profile row.
    pub fn save_profile(&self, profile: &Profile) -> Result<(), KeibalogError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO profiles
             (id, initial_balance, payday, monthly_free_budget, odds_mode, rounding_rule, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                profile.id.to_string(),
                profile.initial_balance,
                profile.payday,
                profile.monthly_free_budget,
                profile.odds_mode,
                profile.rounding_rule,
                iso8601(&profile.created_at),
                iso8601(&profile.updated_at),
            ],
        )
        .map_err(query_error)?;
        Ok(())
    }

    /// Insert a race together with its tickets in one transaction.
    pub fn insert_race(&self, race: &Race) -> Result<(), KeibalogError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        tx.execute(
            "INSERT INTO races (id, date, name, memo, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                race.id.to_string(),
                race.date.format("%Y-%m-%d").to_string(),
                race.name,
                race.memo,
                iso8601(&race.created_at),
                iso8601(&race.updated_at),
            ],
        )
        .map_err(query_error)?;

        for ticket in &race.tickets {
            insert_ticket_tx(&tx, ticket)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(())
    }

    pub fn insert_ticket(&self, ticket: &Ticket) -> Result<(), KeibalogError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        insert_ticket_tx(&tx, ticket)?;
        tx.commit().map_err(query_error)?;
        Ok(())
    }

    /// Delete a race; its tickets go with it.
    pub fn delete_race(&self, race_id: Uuid) -> Result<(), KeibalogError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM races WHERE id = ?1",
            params![race_id.to_string()],
        )
        .map_err(query_error)?;
        Ok(())
    }
}

impl StorePort for SqliteStore {
    fn fetch_profile(&self) -> Result<Option<Profile>, KeibalogError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, initial_balance, payday, monthly_free_budget, odds_mode, rounding_rule,
                        created_at, updated_at
                 FROM profiles ORDER BY created_at LIMIT 1",
            )
            .map_err(query_error)?;

        let mut rows = stmt
            .query_map([], |row| {
                Ok(Profile {
                    id: column_uuid(row, 0)?,
                    initial_balance: row.get(1)?,
                    payday: row.get(2)?,
                    monthly_free_budget: row.get(3)?,
                    odds_mode: row.get(4)?,
                    rounding_rule: row.get(5)?,
                    created_at: column_timestamp(row, 6)?,
                    updated_at: column_timestamp(row, 7)?,
                })
            })
            .map_err(query_error)?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(query_error)?)),
            None => Ok(None),
        }
    }

    fn list_races(&self) -> Result<Vec<Race>, KeibalogError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, date, name, memo, created_at, updated_at
                 FROM races ORDER BY date, created_at",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(Race {
                    id: column_uuid(row, 0)?,
                    date,
                    name: row.get(2)?,
                    memo: row.get(3)?,
                    tickets: Vec::new(),
                    created_at: column_timestamp(row, 4)?,
                    updated_at: column_timestamp(row, 5)?,
                })
            })
            .map_err(query_error)?;

        let mut races = Vec::new();
        for row in rows {
            races.push(row.map_err(query_error)?);
        }
        drop(stmt);
        drop(conn);

        let mut by_race: HashMap<Uuid, Vec<Ticket>> = HashMap::new();
        for ticket in self.list_tickets()? {
            if let Some(race_id) = ticket.race_id {
                by_race.entry(race_id).or_default().push(ticket);
            }
        }
        for race in &mut races {
            if let Some(tickets) = by_race.remove(&race.id) {
                race.tickets = tickets;
            }
        }

        Ok(races)
    }

    fn list_tickets(&self) -> Result<Vec<Ticket>, KeibalogError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, race_id, kind, bet_type, selections_json, stake, payout, odds,
                        linked_actual_id, created_at, updated_at
                 FROM tickets ORDER BY created_at, id",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                let odds_str: Option<String> = row.get(7)?;
                let odds = match odds_str {
                    Some(s) => Some(Decimal::from_str(&s).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            7,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?),
                    None => None,
                };
                Ok(Ticket {
                    id: column_uuid(row, 0)?,
                    race_id: column_opt_uuid(row, 1)?,
                    kind: row.get(2)?,
                    bet_type: row.get(3)?,
                    selections_json: row.get(4)?,
                    stake: row.get(5)?,
                    payout: row.get(6)?,
                    odds,
                    linked_actual_id: column_opt_uuid(row, 8)?,
                    created_at: column_timestamp(row, 9)?,
                    updated_at: column_timestamp(row, 10)?,
                })
            })
            .map_err(query_error)?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row.map_err(query_error)?);
        }
        Ok(tickets)
    }
}

fn insert_ticket_tx(tx: &rusqlite::Transaction<'_>, ticket: &Ticket) -> Result<(), KeibalogError> {
    tx.execute(
        "INSERT INTO tickets
         (id, race_id, kind, bet_type, selections_json, stake, payout, odds, linked_actual_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            ticket.id.to_string(),
            ticket.race_id.map(|id| id.to_string()),
            ticket.kind,
            ticket.bet_type,
            ticket.selections_json,
            ticket.stake,
            ticket.payout,
            ticket.odds.map(|o| o.to_string()),
            ticket.linked_actual_id.map(|id| id.to_string()),
            iso8601(&ticket.created_at),
            iso8601(&ticket.updated_at),
        ],
    )
    .map_err(query_error)?;
    Ok(())
}

fn iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn query_error(e: rusqlite::Error) -> KeibalogError {
    KeibalogError::StoreQuery {
        reason: e.to_string(),
    }
}

fn column_uuid(row: &rusqlite::Row<'_>, idx: usize) -> Result<Uuid, rusqlite::Error> {
    let value: String = row.get(idx)?;
    Uuid::parse_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn column_opt_uuid(row: &rusqlite::Row<'_>, idx: usize) -> Result<Option<Uuid>, rusqlite::Error> {
    let value: Option<String> = row.get(idx)?;
    match value {
        Some(s) => Uuid::parse_str(&s).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
        None => Ok(None),
    }
}

fn column_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let value: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn sample_race() -> Race {
        let mut race = Race::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Some("Nakayama 11R".to_string()),
            None,
            now(),
        );
        let mut actual = Ticket::new(Some(race.id), 0, 0, "[\"7\"]", 1000, now());
        actual.payout = Some(3000);
        actual.odds = Some(dec!(3.2));
        let mut hypothetical = Ticket::new(Some(race.id), 1, 0, "[\"7\"]", 2000, now());
        hypothetical.linked_actual_id = Some(actual.id);
        race.tickets.push(actual);
        race.tickets.push(hypothetical);
        race
    }

    #[test]
    fn from_config_missing_path() {
        match SqliteStore::from_config(&EmptyConfig) {
            Err(KeibalogError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn schema_initializes_in_memory() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize_schema().unwrap();
    }

    #[test]
    fn profile_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize_schema().unwrap();
        assert_eq!(store.fetch_profile().unwrap(), None);

        let mut profile = Profile::new(100_000, now());
        profile.payday = Some(25);
        store.save_profile(&profile).unwrap();

        let fetched = store.fetch_profile().unwrap().unwrap();
        assert_eq!(fetched, profile);
    }

    #[test]
    fn race_round_trip_with_tickets() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize_schema().unwrap();

        let race = sample_race();
        store.insert_race(&race).unwrap();

        let races = store.list_races().unwrap();
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].id, race.id);
        assert_eq!(races[0].tickets.len(), 2);
        let actual = races[0].tickets.iter().find(|t| t.kind == 0).unwrap();
        assert_eq!(actual.payout, Some(3000));
        assert_eq!(actual.odds, Some(dec!(3.2)));
    }

    #[test]
    fn deleting_race_cascades_to_tickets() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize_schema().unwrap();

        let race = sample_race();
        store.insert_race(&race).unwrap();
        assert_eq!(store.list_tickets().unwrap().len(), 2);

        store.delete_race(race.id).unwrap();
        assert!(store.list_races().unwrap().is_empty());
        assert!(store.list_tickets().unwrap().is_empty());
    }

    #[test]
    fn orphan_ticket_listed_but_not_attached() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize_schema().unwrap();

        let ticket = Ticket::new(None, 0, 0, "[]", 500, now());
        store.insert_ticket(&ticket).unwrap();

        assert!(store.list_races().unwrap().is_empty());
        let tickets = store.list_tickets().unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].race_id, None);
    }
}
