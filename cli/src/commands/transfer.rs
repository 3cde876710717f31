use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use stride_core::interchange::{export_csv, parse_ledger_csv};
use stride_core::session::Session;

use super::helpers::print_json;

pub(crate) fn cmd_export(session: &Session, file: &Path, json: bool) -> Result<()> {
    let records = session.ledger().snapshot()?;
    let out = std::fs::File::create(file)
        .with_context(|| format!("Failed to create {}", file.display()))?;
    export_csv(&records, out)?;

    if json {
        #[derive(Serialize)]
        struct Exported<'a> {
            file: &'a Path,
            records: usize,
        }
        print_json(&Exported {
            file,
            records: records.len(),
        })
    } else {
        println!("Exported {} days to {}", records.len(), file.display());
        Ok(())
    }
}

/// Merge a CSV file into the ledger. Rows add to existing days rather than
/// replacing them. A dry run validates every row the same way but writes
/// nothing.
pub(crate) fn cmd_import(session: &Session, file: &Path, dry_run: bool, json: bool) -> Result<()> {
    let data = std::fs::File::open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let rows = parse_ledger_csv(data)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let summary = session.ledger().import(&rows, dry_run)?;
    if json {
        print_json(&summary)
    } else if summary.dry_run {
        println!(
            "Dry run: {} rows across {} days would be merged",
            summary.rows_applied, summary.dates_touched
        );
        Ok(())
    } else {
        println!(
            "Imported {} rows into {} days",
            summary.rows_applied, summary.dates_touched
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::ledger::LedgerOptions;

    fn write_csv(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("import.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_dry_run_rejects_invalid_rows() {
        let tmp = tempfile::TempDir::new().unwrap();
        let session = Session::in_memory("alice", LedgerOptions::default()).unwrap();
        let path = write_csv(&tmp, "date,intake\n2025-01-01,-5\n");

        let err = cmd_import(&session, &path, true, true).unwrap_err();
        assert!(format!("{err:#}").contains("Row 2 (2025-01-01) is invalid"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let session = Session::in_memory("alice", LedgerOptions::default()).unwrap();
        let path = write_csv(&tmp, "date,intake,weight\n2025-01-01,500,\n2025-01-02,,70.5\n");

        cmd_import(&session, &path, true, true).unwrap();
        assert!(session.ledger().snapshot().unwrap().is_empty());

        cmd_import(&session, &path, false, true).unwrap();
        assert_eq!(session.ledger().snapshot().unwrap().len(), 2);
    }
}
