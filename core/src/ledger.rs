//! The daily ledger: one merged record per calendar date.
//!
//! Every write goes straight to the backing SQLite file as a single
//! statement, so a reader never sees a half-applied update and the store is
//! current as soon as [`Ledger::upsert`] returns.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{Database, Probe};
use crate::models::{DailyRecord, Goals, ImportRow, LedgerTotals, RecordUpdate, ValidationError};

const GOALS_KEY: &str = "goals";

/// Source of "today" for the future-date bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    #[must_use]
    pub fn today(self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOptions {
    /// How many days past today a write may target.
    pub max_future_days: i64,
    pub clock: Clock,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            max_future_days: 1,
            clock: Clock::System,
        }
    }
}

/// What [`Ledger::open`] found on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StoreState {
    /// No ledger existed; an empty one was created.
    Created,
    Loaded { records: usize },
    /// The file could not be read as a ledger. It was moved to `quarantined`
    /// and an empty ledger now lives at the original path.
    Recovered { quarantined: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub dry_run: bool,
    /// Rows written, or rows that would be written on a dry run.
    pub rows_applied: usize,
    pub dates_touched: usize,
}

pub struct Ledger {
    db: Database,
    options: LedgerOptions,
}

impl Ledger {
    pub fn open(path: &Path, options: LedgerOptions) -> Result<(Self, StoreState)> {
        let state = match Database::probe(path)? {
            Probe::Missing => StoreState::Created,
            Probe::Healthy => StoreState::Loaded { records: 0 },
            Probe::Unreadable(reason) => {
                let quarantined = quarantine(path)?;
                warn!(
                    path = %path.display(),
                    quarantined = %quarantined.display(),
                    %reason,
                    "ledger unreadable, starting empty"
                );
                StoreState::Recovered {
                    quarantined,
                    reason,
                }
            }
        };

        let db = Database::open(path)?;
        let state = match state {
            StoreState::Loaded { .. } => StoreState::Loaded {
                records: db.count_records()?,
            },
            other => other,
        };
        info!(path = %path.display(), ?state, "ledger opened");
        Ok((Self { db, options }, state))
    }

    pub fn open_in_memory(options: LedgerOptions) -> Result<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
            options,
        })
    }

    #[must_use]
    pub fn options(&self) -> LedgerOptions {
        self.options
    }

    /// Merge `update` into the record for `date`, creating it if needed.
    ///
    /// Rejected updates surface as a [`ValidationError`] inside the returned
    /// error; nothing is written in that case.
    pub fn upsert(&self, date: NaiveDate, update: &RecordUpdate) -> Result<DailyRecord> {
        update.validate()?;
        let limit = self.future_limit();
        if date > limit {
            return Err(ValidationError::FutureDate { date, limit }.into());
        }
        let record = self.db.upsert_record(date, update)?;
        debug!(%date, ?update, "ledger upsert");
        Ok(record)
    }

    fn future_limit(&self) -> NaiveDate {
        self.options.clock.today() + Duration::days(self.options.max_future_days)
    }

    pub fn records_for(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
        self.db.get_record(date)
    }

    /// Every record, ascending by date.
    pub fn snapshot(&self) -> Result<Vec<DailyRecord>> {
        self.db.all_records()
    }

    /// The last `n` records by date, ascending.
    pub fn recent(&self, n: usize) -> Result<Vec<DailyRecord>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut records = self.db.latest_records(n)?;
        records.reverse();
        Ok(records)
    }

    /// Records in `from..=to`, ascending.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRecord>> {
        self.db.records_between(from, to)
    }

    pub fn latest_weight(&self) -> Result<Option<(NaiveDate, f64)>> {
        self.db.latest_weight()
    }

    pub fn totals(&self, from: NaiveDate, to: NaiveDate) -> Result<LedgerTotals> {
        Ok(LedgerTotals::from_records(&self.range(from, to)?))
    }

    /// Apply a batch of updates as one transaction, with the same merge rules
    /// as [`Ledger::upsert`]. Any invalid row aborts the whole batch.
    ///
    /// With `dry_run` every row is still validated, but nothing is written.
    pub fn import(&self, rows: &[ImportRow], dry_run: bool) -> Result<ImportSummary> {
        let limit = self.future_limit();
        for row in rows {
            let invalid = || format!("Row {} ({}) is invalid", row.line, row.date);
            row.update.validate().with_context(invalid)?;
            if row.date > limit {
                let err = ValidationError::FutureDate {
                    date: row.date,
                    limit,
                };
                return Err(anyhow::Error::new(err).context(invalid()));
            }
        }

        let rows_applied = if dry_run {
            rows.len()
        } else {
            self.db.upsert_many(rows)?
        };
        let mut dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        info!(rows = rows_applied, dates = dates.len(), dry_run, "ledger import");
        Ok(ImportSummary {
            dry_run,
            rows_applied,
            dates_touched: dates.len(),
        })
    }

    pub fn goals(&self) -> Result<Goals> {
        match self.db.get_setting(GOALS_KEY)? {
            Some(v) => serde_json::from_str(&v).context("Stored goals are not valid JSON"),
            None => Ok(Goals::default()),
        }
    }

    pub fn set_goals(&self, goals: &Goals) -> Result<()> {
        self.db
            .set_setting(GOALS_KEY, &serde_json::to_string(goals)?)
    }
}

fn quarantine(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    let stamp = Local::now().format("%Y%m%dT%H%M%S");
    let target = path.with_file_name(format!("{name}.corrupt-{stamp}"));
    std::fs::rename(path, &target).with_context(|| {
        format!(
            "Failed to move unreadable ledger {} aside to {}",
            path.display(),
            target.display()
        )
    })?;
    Ok(target)
}
