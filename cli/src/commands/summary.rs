use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::process;

use stride_core::models::{DailyRecord, Goals, LedgerTotals};
use stride_core::session::Session;

use super::helpers::{parse_date, print_json, print_records_table};
use super::log::print_day;

pub(crate) fn cmd_show(session: &Session, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let record = session.ledger().records_for(date)?;
    let goals = session.goals()?;

    if json {
        #[derive(Serialize)]
        struct DayView<'a> {
            date: String,
            record: Option<&'a DailyRecord>,
            goals: Goals,
        }
        return print_json(&DayView {
            date: date.format("%Y-%m-%d").to_string(),
            record: record.as_ref(),
            goals,
        });
    }

    let Some(record) = record else {
        eprintln!("No entries for {}", date.format("%Y-%m-%d"));
        process::exit(2);
    };

    println!("=== {} ===\n", record.date.format("%Y-%m-%d"));
    print_day(&record);
    println!();
    println!(
        "  GOAL: intake {:.0} kcal | burn {:.0} kcal",
        goals.intake_kcal, goals.burn_kcal
    );
    println!(
        "  REMAINING: intake {:.0} kcal | burn {:.0} kcal",
        goals.intake_kcal - record.intake,
        (goals.burn_kcal - record.burned).max(0.0)
    );
    Ok(())
}

/// Show the last `days` logged days, oldest first, with totals.
pub(crate) fn cmd_history(session: &Session, days: usize, json: bool) -> Result<()> {
    let records = session.ledger().recent(days)?;
    let totals = LedgerTotals::from_records(&records);

    if json {
        #[derive(Serialize)]
        struct History<'a> {
            records: &'a [DailyRecord],
            totals: &'a LedgerTotals,
        }
        return print_json(&History {
            records: &records,
            totals: &totals,
        });
    }

    if records.is_empty() {
        eprintln!("Nothing logged yet. Use `stride log` to record a day.");
        process::exit(2);
    }

    print_records_table(&records);
    println!(
        "  {} days | intake {:.0} kcal | burned {:.0} kcal | avg net {:.0} kcal/day | {} steps",
        totals.days, totals.intake, totals.burned, totals.avg_net_calories, totals.steps
    );
    Ok(())
}

/// Totals over the calendar week ending today.
pub(crate) fn cmd_week(session: &Session, json: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let from = today - chrono::Duration::days(6);
    let totals = session.ledger().totals(from, today)?;

    if json {
        return print_json(&totals);
    }

    println!(
        "=== {} .. {} ===\n",
        from.format("%Y-%m-%d"),
        today.format("%Y-%m-%d")
    );
    println!("  Days logged:  {}", totals.days);
    println!("  Intake:       {:.0} kcal", totals.intake);
    println!("  Burned:       {:.0} kcal", totals.burned);
    println!("  Avg net:      {:.0} kcal/day", totals.avg_net_calories);
    println!("  Steps:        {}", totals.steps);
    println!("  Distance:     {:.2} km", totals.distance);
    println!("  Water:        {:.2} L", totals.water_intake);
    println!("  Sleep:        {:.1} h", totals.sleep_hours);
    Ok(())
}
