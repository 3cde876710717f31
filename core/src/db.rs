use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, ErrorCode, OpenFlags, params};

use crate::models::{DailyRecord, ImportRow, RecordUpdate};

pub const SCHEMA_VERSION: i64 = 1;

/// Columns that come from the data itself. A table missing any of these
/// cannot be read as a ledger.
const RECORD_COLUMNS: [&str; 9] = [
    "date",
    "weight",
    "intake",
    "burned",
    "steps",
    "distance",
    "water_intake",
    "sleep_hours",
    "notes",
];

const SELECT_RECORD: &str = "SELECT date, weight, intake, burned, steps, distance,
        water_intake, sleep_hours, notes
     FROM daily_records";

/// Outcome of inspecting an existing file before opening it for writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Missing,
    Healthy,
    Unreadable(String),
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open ledger: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Check whether `path` holds a usable ledger without modifying it.
    ///
    /// Only corruption is reported as `Unreadable`; failing to open the file
    /// at all (permissions, missing directory) is an error.
    pub fn probe(path: &Path) -> Result<Probe> {
        if !path.exists() {
            return Ok(Probe::Missing);
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open ledger: {}", path.display()))?;

        let check: rusqlite::Result<String> =
            conn.query_row("PRAGMA quick_check", [], |row| row.get(0));
        match check {
            Ok(status) if status == "ok" => {}
            Ok(status) => return Ok(Probe::Unreadable(format!("integrity check: {status}"))),
            Err(e) if is_corruption(&e) => return Ok(Probe::Unreadable(e.to_string())),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read ledger: {}", path.display()));
            }
        }

        let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version > SCHEMA_VERSION {
            bail!(
                "Ledger {} was written by a newer version (schema {version}, supported {SCHEMA_VERSION})",
                path.display()
            );
        }

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('daily_records')")?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        if !columns.is_empty() {
            let missing: Vec<&str> = RECORD_COLUMNS
                .iter()
                .copied()
                .filter(|c| !columns.iter().any(|have| have == c))
                .collect();
            if !missing.is_empty() {
                return Ok(Probe::Unreadable(format!(
                    "daily_records is missing columns: {}",
                    missing.join(", ")
                )));
            }
        }

        Ok(Probe::Healthy)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS daily_records (
                    date TEXT PRIMARY KEY,
                    weight REAL,
                    intake REAL NOT NULL DEFAULT 0,
                    burned REAL NOT NULL DEFAULT 0,
                    steps INTEGER NOT NULL DEFAULT 0,
                    distance REAL NOT NULL DEFAULT 0,
                    water_intake REAL NOT NULL DEFAULT 0,
                    sleep_hours REAL NOT NULL DEFAULT 0,
                    notes TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        self.add_missing_timestamps()?;
        Ok(())
    }

    /// Bookkeeping columns are not part of the data, so a table written
    /// without them is repaired in place rather than rejected.
    fn add_missing_timestamps(&self) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info('daily_records')")?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for column in ["created_at", "updated_at"] {
            if !columns.iter().any(|c| c == column) {
                self.conn
                    .execute_batch(&format!(
                        "ALTER TABLE daily_records ADD COLUMN {column} TEXT NOT NULL DEFAULT ''"
                    ))
                    .with_context(|| format!("Failed to add {column} to daily_records"))?;
            }
        }
        Ok(())
    }

    fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<DailyRecord> {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(DailyRecord {
            date,
            weight: row.get(1)?,
            intake: row.get(2)?,
            burned: row.get(3)?,
            steps: row.get(4)?,
            distance: row.get(5)?,
            water_intake: row.get(6)?,
            sleep_hours: row.get(7)?,
            notes: row.get(8)?,
        })
    }

    // --- Daily records ---

    /// Merge `update` into the row for `date` in a single statement.
    ///
    /// Accumulating columns add the delta, `weight` only changes when one is
    /// supplied, and `notes` only changes when non-blank.
    pub fn upsert_record(&self, date: NaiveDate, update: &RecordUpdate) -> Result<DailyRecord> {
        let now = Local::now().to_rfc3339();
        let date_str = date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO daily_records (date, weight, intake, burned, steps, distance,
                water_intake, sleep_hours, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
             ON CONFLICT(date) DO UPDATE SET
                weight = COALESCE(excluded.weight, daily_records.weight),
                intake = daily_records.intake + excluded.intake,
                burned = daily_records.burned + excluded.burned,
                steps = daily_records.steps + excluded.steps,
                distance = daily_records.distance + excluded.distance,
                water_intake = daily_records.water_intake + excluded.water_intake,
                sleep_hours = daily_records.sleep_hours + excluded.sleep_hours,
                notes = CASE WHEN excluded.notes = '' THEN daily_records.notes
                             ELSE excluded.notes END,
                updated_at = excluded.updated_at",
            params![
                date_str,
                update.weight,
                update.intake.unwrap_or(0.0),
                update.burned.unwrap_or(0.0),
                update.steps.unwrap_or(0),
                update.distance.unwrap_or(0.0),
                update.water_intake.unwrap_or(0.0),
                update.sleep_hours.unwrap_or(0.0),
                update.notes().unwrap_or(""),
                now,
            ],
        )?;
        self.get_record(date)?
            .context("Daily record not found after upsert")
    }

    pub fn get_record(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_RECORD} WHERE date = ?1"))?;
        let mut rows = stmt.query(params![date_str])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::record_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn all_records(&self) -> Result<Vec<DailyRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_RECORD} ORDER BY date ASC"))?;
        let records = stmt
            .query_map([], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// The `limit` latest records, newest first.
    pub fn latest_records(&self, limit: usize) -> Result<Vec<DailyRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_RECORD} ORDER BY date DESC LIMIT ?1"))?;
        let records = stmt
            .query_map(params![limit], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn records_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_RECORD} WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC"
        ))?;
        let records = stmt
            .query_map(
                params![
                    from.format("%Y-%m-%d").to_string(),
                    to.format("%Y-%m-%d").to_string()
                ],
                Self::record_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn latest_weight(&self) -> Result<Option<(NaiveDate, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, weight FROM daily_records
             WHERE weight IS NOT NULL ORDER BY date DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            let date_str: String = row.get(0)?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .with_context(|| format!("Invalid date in ledger: '{date_str}'"))?;
            Ok(Some((date, row.get(1)?)))
        } else {
            Ok(None)
        }
    }

    pub fn count_records(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM daily_records", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Apply every update or none of them.
    pub fn upsert_many(&self, rows: &[ImportRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for row in rows {
            self.upsert_record(row.date, &row.update).with_context(|| {
                format!("Failed to import row {} ({})", row.line, row.date)
            })?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    // --- Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }
}

fn is_corruption(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}
