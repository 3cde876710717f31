//! CSV export and import of the ledger table.
//!
//! Columns: `date,weight,intake,burned,steps,distance,water_intake,sleep_hours,notes`.
//! An empty `weight` cell means no weigh-in that day.

use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{DailyRecord, ImportRow, RecordUpdate};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    weight: Option<f64>,
    intake: f64,
    burned: f64,
    steps: i64,
    distance: f64,
    water_intake: f64,
    sleep_hours: f64,
    notes: &'a str,
}

const HEADER: [&str; 9] = [
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

/// Write `records` as CSV, in the order given. The header is written even
/// when there are no records.
pub fn export_csv<W: Write>(records: &[DailyRecord], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(HEADER)?;
    for r in records {
        wtr.serialize(CsvRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            weight: r.weight,
            intake: r.intake,
            burned: r.burned,
            steps: r.steps,
            distance: r.distance,
            water_intake: r.water_intake,
            sleep_hours: r.sleep_hours,
            notes: &r.notes,
        })?;
    }
    wtr.flush().context("Failed to write CSV")?;
    Ok(())
}

/// Parse ledger CSV into per-date updates.
///
/// Only `date` is required; other columns may be missing or empty. Rows are
/// returned in file order and are meant to be merged, not to replace. Each
/// row keeps its file line so later validation errors name the same row.
pub fn parse_ledger_csv<R: Read>(reader: R) -> Result<Vec<ImportRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    let idx_date = col("date").context("Missing required column: date")?;
    let idx_weight = col("weight");
    let idx_intake = col("intake");
    let idx_burned = col("burned");
    let idx_steps = col("steps");
    let idx_distance = col("distance");
    let idx_water = col("water_intake");
    let idx_sleep = col("sleep_hours");
    let idx_notes = col("notes");

    let mut rows = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let row_no = line_num + 2;
        let record = result.with_context(|| format!("Row {row_no}: malformed CSV record"))?;

        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let number = |idx: Option<usize>, name: &str| -> Result<Option<f64>> {
            cell(idx)
                .map(|v| {
                    v.parse::<f64>()
                        .with_context(|| format!("Row {row_no}: invalid {name} '{v}'"))
                })
                .transpose()
        };

        let Some(date_str) = cell(Some(idx_date)) else {
            bail!("Row {row_no}: missing date");
        };
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .with_context(|| format!("Row {row_no}: invalid date '{date_str}', use YYYY-MM-DD"))?;

        let steps = cell(idx_steps)
            .map(|v| {
                v.parse::<i64>()
                    .with_context(|| format!("Row {row_no}: invalid steps '{v}'"))
            })
            .transpose()?;

        rows.push(ImportRow {
            line: row_no,
            date,
            update: RecordUpdate {
                weight: number(idx_weight, "weight")?,
                intake: number(idx_intake, "intake")?,
                burned: number(idx_burned, "burned")?,
                steps,
                distance: number(idx_distance, "distance")?,
                water_intake: number(idx_water, "water_intake")?,
                sleep_hours: number(idx_sleep, "sleep_hours")?,
                notes: cell(idx_notes).map(str::to_string),
            },
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_export_writes_header_and_blank_weight() {
        let mut rec = DailyRecord::empty(date(2025, 1, 2));
        rec.intake = 1800.0;
        rec.steps = 9000;
        rec.notes = "leg day, tired".to_string();
        let mut weighed = DailyRecord::empty(date(2025, 1, 3));
        weighed.weight = Some(70.5);

        let mut out = Vec::new();
        export_csv(&[rec, weighed], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "date,weight,intake,burned,steps,distance,water_intake,sleep_hours,notes"
        );
        assert_eq!(lines[1], "2025-01-02,,1800.0,0.0,9000,0.0,0.0,0.0,\"leg day, tired\"");
        assert!(lines[2].starts_with("2025-01-03,70.5,"));
    }

    #[test]
    fn test_exported_csv_parses_back() {
        let mut rec = DailyRecord::empty(date(2025, 1, 2));
        rec.weight = Some(69.9);
        rec.burned = 420.0;
        rec.sleep_hours = 7.5;

        let mut out = Vec::new();
        export_csv(std::slice::from_ref(&rec), &mut out).unwrap();
        let rows = parse_ledger_csv(out.as_slice()).unwrap();

        assert_eq!(rows.len(), 1);
        let mut rebuilt = DailyRecord::empty(rows[0].date);
        rebuilt.apply(&rows[0].update);
        assert_eq!(rebuilt, rec);
    }

    #[test]
    fn test_export_empty_ledger_still_has_header() {
        let mut out = Vec::new();
        export_csv(&[], &mut out).unwrap();
        let rows = parse_ledger_csv(out.as_slice()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_partial_columns() {
        let csv = "Date,Intake,Notes\n2025-01-05,450,\n2025-01-05,300,dinner out\n";
        let rows = parse_ledger_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[0].update.intake, Some(450.0));
        assert!(rows[0].update.notes.is_none());
        assert!(rows[0].update.weight.is_none());
        assert_eq!(rows[1].update.notes.as_deref(), Some("dinner out"));
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let csv = "date,intake\n05/01/2025,450\n";
        let err = parse_ledger_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn test_parse_rejects_bad_number() {
        let csv = "date,steps\n2025-01-05,lots\n";
        let err = parse_ledger_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid steps"));
    }

    #[test]
    fn test_parse_requires_date_column() {
        let err = parse_ledger_csv("intake\n100\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("date"));
    }
}
