//! SQLite-backed document store.
//!
//! Every kith collection (users, circles with their members and
//! invites, events, notifications, family members) lives in one SQLite
//! database. Writes that must stay consistent, such as creating a
//! circle together with its owner membership or consuming an invite
//! token, run in a transaction.

mod circles;
mod events;
mod family;
mod notifications;
mod users;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;

use crate::error::{KithError, KithResult};

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/0001_init.sql"),
}];

/// Handle to the kith database. Opening applies pending migrations, so
/// a `Store` is always at the current schema version.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> KithResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> KithResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> KithResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_migrations(&mut conn)?;
        Ok(Store { conn })
    }
}

fn apply_migrations(conn: &mut Connection) -> KithResult<()> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let latest = MIGRATIONS.last().map_or(0, |m| m.version);

    if current > latest {
        return Err(KithError::Store(format!(
            "Database schema version {} is newer than this binary supports ({})",
            current, latest
        )));
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
    }
    tx.execute_batch(&format!("PRAGMA user_version = {}", latest))?;
    tx.commit()?;

    Ok(())
}

// Column codecs. Timestamps are RFC 3339, dates are YYYY-MM-DD and
// times are HH:MM, all stored as TEXT.

fn timestamp_to_column(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn timestamp_from_column(raw: &str) -> KithResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KithError::Store(format!("Invalid stored timestamp '{}': {}", raw, e)))
}

fn date_to_column(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn date_from_column(raw: &str) -> KithResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| KithError::Store(format!("Invalid stored date '{}': {}", raw, e)))
}

fn time_to_column(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn time_from_column(raw: &str) -> KithResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|e| KithError::Store(format!("Invalid stored time '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_applies_migrations() {
        let store = Store::open_in_memory().unwrap();

        let version: u32 = store
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kith.db");

        Store::open(&path).unwrap();
        Store::open(&path).unwrap();
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute_batch("PRAGMA user_version = 99")
            .unwrap();

        let result = apply_migrations(&mut Connection::open_in_memory().unwrap());
        assert!(result.is_ok(), "fresh connection still migrates");

        // Reusing the bumped connection must fail
        let mut conn = store.conn;
        assert!(apply_migrations(&mut conn).is_err());
    }

    #[test]
    fn test_column_codecs_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(date_from_column(&date_to_column(&date)).unwrap(), date);

        let time = NaiveTime::from_hms_opt(18, 30, 0).unwrap();
        assert_eq!(time_from_column(&time_to_column(&time)).unwrap(), time);

        let ts = Utc::now();
        assert_eq!(timestamp_from_column(&timestamp_to_column(&ts)).unwrap(), ts);
    }
}
