use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use stride_core::models::DailyRecord;

/// Parse a food quantity in grams: "200", "200g", "150.5 g".
pub(crate) fn parse_grams(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches('g').trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("Invalid quantity: '{s}'. Use a number like '200' or '200g'"))?;
    if value <= 0.0 || !value.is_finite() {
        bail!("Quantity must be greater than 0");
    }
    Ok(value)
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")
            }),
        },
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn format_weight(weight: Option<f64>) -> String {
    weight.map_or("-".into(), |w| format!("{w:.1}"))
}

pub(crate) fn print_records_table(records: &[DailyRecord]) {
    #[derive(Tabled)]
    struct RecordRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Intake")]
        intake: String,
        #[tabled(rename = "Burned")]
        burned: String,
        #[tabled(rename = "Net")]
        net: String,
        #[tabled(rename = "Steps")]
        steps: i64,
        #[tabled(rename = "Km")]
        distance: String,
        #[tabled(rename = "Water (L)")]
        water: String,
        #[tabled(rename = "Sleep (h)")]
        sleep: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            weight: format_weight(r.weight),
            intake: format!("{:.0}", r.intake),
            burned: format!("{:.0}", r.burned),
            net: format!("{:.0}", no_neg_zero(r.net_calories())),
            steps: r.steps,
            distance: format!("{:.2}", r.distance),
            water: format!("{:.2}", r.water_intake),
            sleep: format!("{:.1}", r.sleep_hours),
            notes: truncate(&r.notes, 30),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..9)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
