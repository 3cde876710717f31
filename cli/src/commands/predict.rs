use anyhow::Result;

use stride_core::predictor::{InsufficientData, Prediction};
use stride_core::session::Session;

use super::helpers::print_json;

pub(crate) fn cmd_predict(session: &Session, days: i64, json: bool) -> Result<()> {
    let prediction = session.forecast(days)?;

    if json {
        return print_json(&prediction);
    }

    match prediction {
        Prediction::Forecast(f) => {
            println!(
                "Predicted weight on {} ({days} days out): {:.2} kg",
                f.target_date.format("%Y-%m-%d"),
                f.weight_kg
            );
            println!(
                "  Based on {} weigh-ins, assuming {:.0} kcal/day net (last 3 days)",
                f.samples, f.avg_net_calories
            );
            println!(
                "  Trend: {:+.3} kg/day, {:+.5} kg per net kcal",
                f.model.per_day, f.model.per_net_kcal
            );
        }
        Prediction::InsufficientData(reason @ InsufficientData::HorizonOutOfRange { .. }) => {
            println!("Cannot predict: {reason}.");
        }
        Prediction::InsufficientData(reason) => {
            println!("Need more data to predict: {reason}.");
            println!("  Log your weight on at least 3 different days.");
        }
    }
    Ok(())
}
