use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::catalog::{NutritionCatalog, calories_for};
use crate::ledger::{Ledger, LedgerOptions, StoreState};
use crate::models::{DailyRecord, Goals, RecordUpdate, walking_calories};
use crate::predictor::{Prediction, predict};

/// Result of logging a meal through the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct MealLog {
    pub food: String,
    pub grams: f64,
    pub calories: f64,
    pub record: DailyRecord,
}

/// Result of logging a walk.
#[derive(Debug, Clone, Serialize)]
pub struct WalkLog {
    pub distance_km: f64,
    pub weight_kg: f64,
    pub calories: f64,
    pub record: DailyRecord,
}

/// One user's working context: who is logging and which ledger they write to.
pub struct Session {
    user: String,
    ledger: Ledger,
    store_state: StoreState,
}

impl Session {
    /// Open `<data_dir>/<user>.db`, creating the directory if needed.
    pub fn open(user: &str, data_dir: &Path, options: LedgerOptions) -> Result<Self> {
        validate_user(user)?;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        let path = ledger_path(data_dir, user);
        let (ledger, store_state) = Ledger::open(&path, options)?;
        info!(user, path = %path.display(), "session opened");
        Ok(Self {
            user: user.to_string(),
            ledger,
            store_state,
        })
    }

    pub fn in_memory(user: &str, options: LedgerOptions) -> Result<Self> {
        validate_user(user)?;
        Ok(Self {
            user: user.to_string(),
            ledger: Ledger::open_in_memory(options)?,
            store_state: StoreState::Created,
        })
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn store_state(&self) -> &StoreState {
        &self.store_state
    }

    pub fn log(&self, date: NaiveDate, update: &RecordUpdate) -> Result<DailyRecord> {
        self.ledger.upsert(date, update)
    }

    /// Add the calories of `grams` of `food` to the day's intake.
    pub fn log_meal(
        &self,
        catalog: &dyn NutritionCatalog,
        date: NaiveDate,
        food: &str,
        grams: f64,
    ) -> Result<MealLog> {
        if !grams.is_finite() || grams <= 0.0 {
            bail!("Quantity must be greater than 0 g");
        }
        let Some(calories) = calories_for(catalog, food, grams) else {
            bail!("Food not found: '{food}'");
        };
        let record = self.ledger.upsert(date, &RecordUpdate::intake(calories))?;
        Ok(MealLog {
            food: food.trim().to_string(),
            grams,
            calories,
            record,
        })
    }

    /// Add a walk's distance and estimated calories to the day.
    ///
    /// Without an explicit weight, the most recent logged weight is used.
    pub fn log_walk(
        &self,
        date: NaiveDate,
        distance_km: f64,
        weight_kg: Option<f64>,
    ) -> Result<WalkLog> {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            bail!("Distance must be greater than 0 km");
        }
        let weight_kg = match weight_kg {
            Some(w) if w.is_finite() && w > 0.0 => w,
            Some(w) => bail!("Weight must be greater than 0 kg (got {w})"),
            None => match self.ledger.latest_weight()? {
                Some((_, w)) => w,
                None => bail!("No weight on record; pass one explicitly or log a weigh-in first"),
            },
        };
        let calories = walking_calories(weight_kg, distance_km);
        let record = self.ledger.upsert(
            date,
            &RecordUpdate {
                burned: Some(calories),
                distance: Some(distance_km),
                ..RecordUpdate::default()
            },
        )?;
        Ok(WalkLog {
            distance_km,
            weight_kg,
            calories,
            record,
        })
    }

    pub fn goals(&self) -> Result<Goals> {
        self.ledger.goals()
    }

    pub fn set_goals(&self, goals: &Goals) -> Result<()> {
        for (name, value) in [("intake", goals.intake_kcal), ("burn", goals.burn_kcal)] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} goal must be a non-negative number (got {value})");
            }
        }
        self.ledger.set_goals(goals)
    }

    pub fn forecast(&self, horizon_days: i64) -> Result<Prediction> {
        Ok(predict(&self.ledger.snapshot()?, horizon_days))
    }
}

#[must_use]
pub fn ledger_path(data_dir: &Path, user: &str) -> PathBuf {
    data_dir.join(format!("{user}.db"))
}

fn validate_user(user: &str) -> Result<()> {
    if user.is_empty() || user.len() > 64 {
        bail!("User name must be 1-64 characters");
    }
    if !user
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!("User name '{user}' may only contain letters, digits, '_' and '-'");
    }
    Ok(())
}
