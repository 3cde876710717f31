use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calories burned per kg of body weight per km walked.
pub const WALKING_KCAL_PER_KG_KM: f64 = 0.9;

pub const DEFAULT_INTAKE_GOAL_KCAL: f64 = 2200.0;
pub const DEFAULT_BURN_GOAL_KCAL: f64 = 500.0;

/// One calendar day of fitness metrics.
///
/// Accumulating fields sum across every write for the date; `weight` and
/// `notes` are replaced by the latest write that supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub intake: f64,
    pub burned: f64,
    pub steps: i64,
    pub distance: f64,
    pub water_intake: f64,
    pub sleep_hours: f64,
    #[serde(default)]
    pub notes: String,
}

impl DailyRecord {
    /// A record with nothing logged yet.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            weight: None,
            intake: 0.0,
            burned: 0.0,
            steps: 0,
            distance: 0.0,
            water_intake: 0.0,
            sleep_hours: 0.0,
            notes: String::new(),
        }
    }

    #[must_use]
    pub fn net_calories(&self) -> f64 {
        self.intake - self.burned
    }

    /// Merge an update into this record in memory, with the same rules the
    /// ledger applies on disk.
    pub fn apply(&mut self, update: &RecordUpdate) {
        self.intake += update.intake.unwrap_or(0.0);
        self.burned += update.burned.unwrap_or(0.0);
        self.steps += update.steps.unwrap_or(0);
        self.distance += update.distance.unwrap_or(0.0);
        self.water_intake += update.water_intake.unwrap_or(0.0);
        self.sleep_hours += update.sleep_hours.unwrap_or(0.0);
        if let Some(w) = update.weight {
            self.weight = Some(w);
        }
        if let Some(n) = update.notes() {
            self.notes = n.to_string();
        }
    }
}

/// A partial write against one date.
///
/// `None` on an accumulating field means "no delta"; `None` on `weight` or
/// `notes` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burned: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_intake: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RecordUpdate {
    #[must_use]
    pub fn intake(kcal: f64) -> Self {
        Self {
            intake: Some(kcal),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn burned(kcal: f64) -> Self {
        Self {
            burned: Some(kcal),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn weight(kg: f64) -> Self {
        Self {
            weight: Some(kg),
            ..Self::default()
        }
    }

    /// Notes that would actually overwrite: blank strings count as absent.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weight.is_none()
            && self.intake.is_none()
            && self.burned.is_none()
            && self.steps.is_none()
            && self.distance.is_none()
            && self.water_intake.is_none()
            && self.sleep_hours.is_none()
            && self.notes().is_none()
    }

    /// Reject inputs the ledger must never store. Values are not clamped.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<(), ValidationError> {
        let deltas = [
            ("intake", self.intake),
            ("burned", self.burned),
            ("distance", self.distance),
            ("water_intake", self.water_intake),
            ("sleep_hours", self.sleep_hours),
        ];
        for (field, value) in deltas {
            let Some(v) = value else { continue };
            if !v.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
            if v < 0.0 {
                return Err(ValidationError::NegativeValue { field, value: v });
            }
        }
        if let Some(steps) = self.steps {
            if steps < 0 {
                return Err(ValidationError::NegativeValue {
                    field: "steps",
                    value: steps as f64,
                });
            }
        }
        if let Some(w) = self.weight {
            if !w.is_finite() || w <= 0.0 {
                return Err(ValidationError::InvalidWeight(w));
            }
        }
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(())
    }
}

/// One row of a batch import.
///
/// `line` is the 1-based line in the source file (the header is line 1), so
/// parse and validation errors point at the same place.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub line: usize,
    pub date: NaiveDate,
    pub update: RecordUpdate,
}

/// Why a write was refused at the ledger boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must not be negative (got {value})")]
    NegativeValue { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("weight must be greater than 0 kg (got {0})")]
    InvalidWeight(f64),

    #[error("{date} is too far in the future (latest allowed: {limit})")]
    FutureDate { date: NaiveDate, limit: NaiveDate },

    #[error("nothing to log: supply at least one field")]
    EmptyUpdate,
}

/// Daily calorie goals shown next to the logged totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    pub intake_kcal: f64,
    pub burn_kcal: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            intake_kcal: DEFAULT_INTAKE_GOAL_KCAL,
            burn_kcal: DEFAULT_BURN_GOAL_KCAL,
        }
    }
}

/// Sums and averages over a run of daily records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerTotals {
    pub days: usize,
    pub intake: f64,
    pub burned: f64,
    pub net_calories: f64,
    pub avg_net_calories: f64,
    pub steps: i64,
    pub distance: f64,
    pub water_intake: f64,
    pub sleep_hours: f64,
}

impl LedgerTotals {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[DailyRecord]) -> Self {
        let mut totals = Self {
            days: records.len(),
            ..Self::default()
        };
        for r in records {
            totals.intake += r.intake;
            totals.burned += r.burned;
            totals.steps += r.steps;
            totals.distance += r.distance;
            totals.water_intake += r.water_intake;
            totals.sleep_hours += r.sleep_hours;
        }
        totals.net_calories = totals.intake - totals.burned;
        if totals.days > 0 {
            totals.avg_net_calories = totals.net_calories / totals.days as f64;
        }
        totals
    }
}

/// Calories burned walking `distance_km` at `weight_kg`.
#[must_use]
pub fn walking_calories(weight_kg: f64, distance_km: f64) -> f64 {
    weight_kg * distance_km * WALKING_KCAL_PER_KG_KM
}
