use std::path::Path;

use anyhow::{Result, bail};

use stride_core::catalog::CsvCatalog;
use stride_core::models::{DailyRecord, RecordUpdate};
use stride_core::session::Session;

use super::helpers::{format_weight, parse_date, parse_grams, print_json};

pub(crate) fn cmd_log(
    session: &Session,
    date: Option<String>,
    update: &RecordUpdate,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let record = session.log(date, update)?;

    if json {
        print_json(&record)
    } else {
        println!("Logged for {}", record.date.format("%Y-%m-%d"));
        print_day(&record);
        Ok(())
    }
}

pub(crate) fn cmd_eat(
    session: &Session,
    catalog_path: &Path,
    food: &str,
    quantity: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if !catalog_path.exists() {
        bail!(
            "Food table not found at {}. Pass --catalog or place a Food,Calories CSV there",
            catalog_path.display()
        );
    }
    let catalog = CsvCatalog::load(catalog_path)?;
    let grams = parse_grams(quantity)?;
    let date = parse_date(date)?;
    let meal = session.log_meal(&catalog, date, food, grams)?;

    if json {
        print_json(&meal)
    } else {
        println!(
            "Logged {:.0}g {} = {:.2} kcal for {}",
            meal.grams,
            meal.food,
            meal.calories,
            meal.record.date.format("%Y-%m-%d")
        );
        println!("  Intake today: {:.0} kcal", meal.record.intake);
        Ok(())
    }
}

pub(crate) fn cmd_walk(
    session: &Session,
    distance_km: f64,
    weight_kg: Option<f64>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let walk = session.log_walk(date, distance_km, weight_kg)?;

    if json {
        print_json(&walk)
    } else {
        println!(
            "Walked {:.2} km at {:.1} kg: {:.2} kcal burned",
            walk.distance_km, walk.weight_kg, walk.calories
        );
        println!(
            "  Burned today: {:.0} kcal over {:.2} km",
            walk.record.burned, walk.record.distance
        );
        Ok(())
    }
}

pub(super) fn print_day(r: &DailyRecord) {
    println!("  Weight:  {} kg", format_weight(r.weight));
    println!(
        "  Intake:  {:.0} kcal | Burned: {:.0} kcal | Net: {:.0} kcal",
        r.intake,
        r.burned,
        r.net_calories()
    );
    println!("  Steps:   {} | Distance: {:.2} km", r.steps, r.distance);
    println!(
        "  Water:   {:.2} L | Sleep: {:.1} h",
        r.water_intake, r.sleep_hours
    );
    if !r.notes.is_empty() {
        println!("  Notes:   {}", r.notes);
    }
}
