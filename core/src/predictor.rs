//! Weight trend forecasting.
//!
//! Fits `weight ~ days_since_start + net_calories` by ordinary least squares
//! over every weighed day and evaluates the fit `horizon_days` past the last
//! sample, assuming the recent calorie balance continues.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::DailyRecord;

/// Fewest weighed days a forecast is attempted with.
pub const MIN_SAMPLES: usize = 3;

/// How many of the latest samples set the assumed future calorie balance.
pub const NET_CALORIE_WINDOW: usize = 3;

/// Longest horizon, in either direction, a forecast is made for.
pub const MAX_HORIZON_DAYS: i64 = 3650;

/// Fitted coefficients: `weight = intercept + per_day * d + per_net_kcal * n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendModel {
    pub intercept: f64,
    pub per_day: f64,
    pub per_net_kcal: f64,
}

impl TrendModel {
    #[must_use]
    pub fn evaluate(&self, days_since_start: f64, net_calories: f64) -> f64 {
        self.intercept + self.per_day * days_since_start + self.per_net_kcal * net_calories
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightForecast {
    /// Predicted weight in kg, rounded to 2 decimals.
    pub weight_kg: f64,
    pub horizon_days: i64,
    pub target_date: NaiveDate,
    pub samples: usize,
    pub avg_net_calories: f64,
    pub model: TrendModel,
}

/// Why no forecast could be made. This is an expected outcome, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InsufficientData {
    TooFewSamples { available: usize, required: usize },
    NoDateVariation,
    HorizonOutOfRange { horizon_days: i64, max: i64 },
}

impl InsufficientData {
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            InsufficientData::TooFewSamples { .. } => "fewer than 3 weight samples",
            InsufficientData::NoDateVariation => "no variation across sample dates",
            InsufficientData::HorizonOutOfRange { .. } => "forecast horizon out of range",
        }
    }
}

impl std::fmt::Display for InsufficientData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsufficientData::TooFewSamples { available, required } => write!(
                f,
                "{} (have {available}, need {required})",
                self.reason()
            ),
            InsufficientData::NoDateVariation => f.write_str(self.reason()),
            InsufficientData::HorizonOutOfRange { horizon_days, max } => write!(
                f,
                "{} ({horizon_days} days, at most {max} either way)",
                self.reason()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Prediction {
    Forecast(WeightForecast),
    InsufficientData(InsufficientData),
}

impl Prediction {
    #[must_use]
    pub fn forecast(&self) -> Option<&WeightForecast> {
        match self {
            Prediction::Forecast(f) => Some(f),
            Prediction::InsufficientData(_) => None,
        }
    }
}

struct Sample {
    date: NaiveDate,
    days: f64,
    net: f64,
    weight: f64,
}

/// Forecast weight `horizon_days` after the last weighed day in `records`.
///
/// Records without a weight are ignored. Input order does not matter.
/// Horizons beyond [`MAX_HORIZON_DAYS`] are reported, never evaluated.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn predict(records: &[DailyRecord], horizon_days: i64) -> Prediction {
    if !(-MAX_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&horizon_days) {
        return Prediction::InsufficientData(InsufficientData::HorizonOutOfRange {
            horizon_days,
            max: MAX_HORIZON_DAYS,
        });
    }
    let mut weighed: Vec<(&DailyRecord, f64)> = records
        .iter()
        .filter_map(|r| r.weight.map(|w| (r, w)))
        .collect();
    if weighed.len() < MIN_SAMPLES {
        return Prediction::InsufficientData(InsufficientData::TooFewSamples {
            available: weighed.len(),
            required: MIN_SAMPLES,
        });
    }
    weighed.sort_by_key(|(r, _)| r.date);

    let t0 = weighed[0].0.date;
    let samples: Vec<Sample> = weighed
        .iter()
        .map(|(r, w)| Sample {
            date: r.date,
            days: (r.date - t0).num_days() as f64,
            net: r.net_calories(),
            weight: *w,
        })
        .collect();

    let Some(model) = fit(&samples) else {
        return Prediction::InsufficientData(InsufficientData::NoDateVariation);
    };

    let last = &samples[samples.len() - 1];
    let Some(target_date) = Duration::try_days(horizon_days)
        .and_then(|horizon| last.date.checked_add_signed(horizon))
    else {
        return Prediction::InsufficientData(InsufficientData::HorizonOutOfRange {
            horizon_days,
            max: MAX_HORIZON_DAYS,
        });
    };
    let future_day = last.days + horizon_days as f64;
    let window = &samples[samples.len() - NET_CALORIE_WINDOW..];
    let avg_net_calories = window.iter().map(|s| s.net).sum::<f64>() / window.len() as f64;

    let raw = model.evaluate(future_day, avg_net_calories);
    Prediction::Forecast(WeightForecast {
        weight_kg: round2(raw),
        horizon_days,
        target_date,
        samples: samples.len(),
        avg_net_calories,
        model,
    })
}

/// Least-squares fit with intercept on the two regressors.
///
/// Works on centred data so the intercept drops out, then solves through a
/// singular value decomposition of the two centred columns. Singular values
/// under `EPSILON * max(rows, 2)` times the largest are dropped, the usual
/// least-squares cutoff, so collinear regressors give the minimum-norm
/// solution. Returns `None` when the day regressor has no spread.
#[allow(clippy::cast_precision_loss)]
fn fit(samples: &[Sample]) -> Option<TrendModel> {
    let n = samples.len() as f64;
    let mean_d = samples.iter().map(|s| s.days).sum::<f64>() / n;
    let mean_n = samples.iter().map(|s| s.net).sum::<f64>() / n;
    let mean_w = samples.iter().map(|s| s.weight).sum::<f64>() / n;

    let days: Vec<f64> = samples.iter().map(|s| s.days - mean_d).collect();
    let nets: Vec<f64> = samples.iter().map(|s| s.net - mean_n).collect();
    let weights: Vec<f64> = samples.iter().map(|s| s.weight - mean_w).collect();

    if days.iter().all(|d| *d == 0.0) {
        return None;
    }

    let (per_day, per_net_kcal) = solve_two_columns(&days, &nets, &weights);
    let intercept = mean_w - per_day * mean_d - per_net_kcal * mean_n;

    Some(TrendModel {
        intercept,
        per_day,
        per_net_kcal,
    })
}

/// Minimum-norm least-squares solution of `[x1 x2] * beta = y`.
///
/// One Jacobi rotation orthogonalises the two columns, which gives the SVD
/// directly: the rotated columns are `U * Sigma` and the rotation is `V`.
/// Small singular values come from the rotated entries themselves, so they
/// stay accurate where the normal equations would square them away.
#[allow(clippy::cast_precision_loss, clippy::many_single_char_names)]
fn solve_two_columns(x1: &[f64], x2: &[f64], y: &[f64]) -> (f64, f64) {
    let alpha = dot(x1, x1);
    let beta = dot(x2, x2);
    let gamma = dot(x1, x2);

    let (c, s) = if gamma == 0.0 {
        (1.0, 0.0)
    } else {
        let zeta = (beta - alpha) / (2.0 * gamma);
        let t = zeta.signum() / (zeta.abs() + zeta.hypot(1.0));
        let c = 1.0 / t.hypot(1.0);
        (c, c * t)
    };

    let u1: Vec<f64> = x1.iter().zip(x2).map(|(a, b)| c * a - s * b).collect();
    let u2: Vec<f64> = x1.iter().zip(x2).map(|(a, b)| s * a + c * b).collect();
    let sigma1 = dot(&u1, &u1).sqrt();
    let sigma2 = dot(&u2, &u2).sqrt();

    let cutoff = f64::EPSILON * (x1.len().max(2) as f64) * sigma1.max(sigma2);
    let coefficient = |u: &[f64], sigma: f64| {
        if sigma > cutoff {
            dot(u, y) / (sigma * sigma)
        } else {
            0.0
        }
    };
    let k1 = coefficient(&u1, sigma1);
    let k2 = coefficient(&u2, sigma2);

    (c * k1 + s * k2, c * k2 - s * k1)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(day: u32, weight: Option<f64>, intake: f64, burned: f64) -> DailyRecord {
        DailyRecord {
            weight,
            intake,
            burned,
            ..DailyRecord::empty(date(2025, 1, day))
        }
    }

    #[test]
    fn test_two_weighed_days_is_insufficient() {
        let records = vec![
            record(1, Some(70.0), 2000.0, 300.0),
            record(2, Some(70.2), 2100.0, 300.0),
        ];
        let p = predict(&records, 7);
        assert_eq!(
            p,
            Prediction::InsufficientData(InsufficientData::TooFewSamples {
                available: 2,
                required: 3
            })
        );
    }

    #[test]
    fn test_unweighed_days_do_not_count_toward_minimum() {
        let records = vec![
            record(1, Some(70.0), 2000.0, 300.0),
            record(2, None, 2100.0, 300.0),
            record(3, None, 2100.0, 300.0),
            record(4, Some(70.2), 2100.0, 300.0),
        ];
        let p = predict(&records, 7);
        let Prediction::InsufficientData(reason) = p else {
            panic!("expected insufficient data");
        };
        assert_eq!(reason.reason(), "fewer than 3 weight samples");
    }

    #[test]
    fn test_single_date_is_degenerate() {
        // The ledger never holds duplicate dates, but callers may pass any slice.
        let records = vec![
            record(5, Some(70.0), 2000.0, 0.0),
            record(5, Some(70.5), 2500.0, 0.0),
            record(5, Some(71.0), 3000.0, 0.0),
        ];
        let p = predict(&records, 7);
        let Prediction::InsufficientData(reason) = p else {
            panic!("expected insufficient data");
        };
        assert_eq!(reason, InsufficientData::NoDateVariation);
        assert_eq!(reason.reason(), "no variation across sample dates");
    }

    #[test]
    fn test_collinear_example_uses_minimum_norm_fit() {
        // Net calories are exactly 200 * day, so only the combined direction is
        // identifiable.
        let records = vec![
            record(1, Some(70.0), 2000.0, 2000.0),
            record(2, Some(70.1), 2200.0, 2000.0),
            record(3, Some(70.3), 2400.0, 2000.0),
        ];
        let forecast = predict(&records, 7).forecast().cloned().unwrap();

        // Minimum-norm coefficients: beta = (a.y / (|a|^2 |v|^2)) v with
        // a = (-1, 0, 1), v = (1, 200).
        let scale = 0.3 / (2.0 * 40_001.0);
        assert!((forecast.model.per_day - scale).abs() < 1e-12);
        assert!((forecast.model.per_net_kcal - 200.0 * scale).abs() < 1e-10);

        let mean_w = (70.0 + 70.1 + 70.3) / 3.0;
        let expected = mean_w + scale * (9.0 - 1.0) + 200.0 * scale * (200.0 - 200.0);
        assert!((forecast.weight_kg - round2(expected)).abs() < 1e-9);
        assert!((forecast.weight_kg - 70.13).abs() < 1e-9);
        assert!((forecast.avg_net_calories - 200.0).abs() < 1e-9);
        assert_eq!(forecast.target_date, date(2025, 1, 10));
        assert_eq!(forecast.samples, 3);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let records = vec![
            record(1, Some(70.0), 2000.0, 2000.0),
            record(2, Some(70.1), 2200.0, 2000.0),
            record(3, Some(70.3), 2400.0, 2000.0),
        ];
        let first = predict(&records, 7);
        for _ in 0..10 {
            assert_eq!(predict(&records, 7), first);
        }
    }

    #[test]
    fn test_full_rank_fit_recovers_exact_plane() {
        // weight = 80 - 0.05 * day + 0.001 * net, with independent regressors.
        let nets = [500.0, -200.0, 300.0, 0.0, -600.0, 100.0];
        let records: Vec<DailyRecord> = nets
            .iter()
            .enumerate()
            .map(|(i, net)| {
                let day = i as f64;
                let w = 80.0 - 0.05 * day + 0.001 * net;
                record(i as u32 + 1, Some(w), 2000.0 + net, 2000.0)
            })
            .collect();

        let forecast = predict(&records, 4).forecast().cloned().unwrap();
        assert!((forecast.model.intercept - 80.0).abs() < 1e-9);
        assert!((forecast.model.per_day + 0.05).abs() < 1e-9);
        assert!((forecast.model.per_net_kcal - 0.001).abs() < 1e-9);

        // Last three nets: 0, -600, 100 -> mean -166.67; future day 5 + 4 = 9.
        let avg = (0.0 - 600.0 + 100.0) / 3.0;
        let expected = round2(80.0 - 0.05 * 9.0 + 0.001 * avg);
        assert!((forecast.weight_kg - expected).abs() < 1e-9);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut records = vec![
            record(3, Some(69.8), 1800.0, 500.0),
            record(1, Some(70.4), 2500.0, 300.0),
            record(7, Some(69.1), 1700.0, 600.0),
            record(4, Some(69.9), 2200.0, 200.0),
        ];
        let unsorted = predict(&records, 14);
        records.sort_by_key(|r| r.date);
        let sorted = predict(&records, 14);
        assert_eq!(unsorted, sorted);

        // Net window is the last three by date: days 3, 4, 7.
        let f = sorted.forecast().unwrap();
        let avg = (1300.0 + 2000.0 + 1100.0) / 3.0;
        assert!((f.avg_net_calories - avg).abs() < 1e-9);
        assert_eq!(f.target_date, date(2025, 1, 21));
    }

    #[test]
    fn test_days_measured_from_first_weighed_date() {
        // An unweighed earlier day must not shift t0.
        let with_gap = vec![
            record(1, None, 3000.0, 0.0),
            record(5, Some(80.0), 2000.0, 2500.0),
            record(6, Some(79.8), 2100.0, 2400.0),
            record(8, Some(79.5), 1900.0, 2600.0),
        ];
        let without_gap: Vec<DailyRecord> = with_gap[1..].to_vec();
        assert_eq!(predict(&with_gap, 7), predict(&without_gap, 7));
    }

    #[test]
    fn test_round2() {
        assert!((round2(70.134_9) - 70.13).abs() < 1e-12);
        assert!((round2(70.135_1) - 70.14).abs() < 1e-12);
    }

    #[test]
    fn test_nearly_collinear_fit_keeps_full_rank() {
        // Net calories track 200 * day with a little noise, which is still an
        // identifiable plane.
        let noise = [0.0, 0.5, 0.0, -0.25, 0.1];
        let records: Vec<DailyRecord> = noise
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let day = i as f64;
                let net = 200.0 * day + e;
                let w = 80.0 - 0.05 * day + 0.001 * net;
                record(i as u32 + 1, Some(w), 2000.0 + net, 2000.0)
            })
            .collect();

        let model = predict(&records, 7).forecast().cloned().unwrap().model;
        assert!((model.per_day + 0.05).abs() < 1e-6);
        assert!((model.per_net_kcal - 0.001).abs() < 1e-6);
        assert!((model.intercept - 80.0).abs() < 1e-6);
    }

    #[test]
    fn test_huge_horizon_is_reported_not_evaluated() {
        let records = vec![
            record(1, Some(70.0), 2000.0, 2000.0),
            record(2, Some(70.1), 2200.0, 2000.0),
            record(3, Some(70.3), 2400.0, 2000.0),
        ];
        for horizon in [100_000_000, i64::MAX, i64::MIN, MAX_HORIZON_DAYS + 1] {
            assert_eq!(
                predict(&records, horizon),
                Prediction::InsufficientData(InsufficientData::HorizonOutOfRange {
                    horizon_days: horizon,
                    max: MAX_HORIZON_DAYS,
                })
            );
        }

        let furthest = predict(&records, MAX_HORIZON_DAYS);
        assert_eq!(
            furthest.forecast().unwrap().target_date,
            date(2025, 1, 3) + Duration::days(MAX_HORIZON_DAYS)
        );
    }

    #[test]
    fn test_solve_two_columns_orthogonal() {
        let (b1, b2) = solve_two_columns(&[1.0, -1.0, 0.0], &[0.0, 0.0, 2.0], &[3.0, -3.0, 1.0]);
        assert!((b1 - 3.0).abs() < 1e-12);
        assert!((b2 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_solve_two_columns_identical_columns_split_evenly() {
        let x = [-1.0, 0.0, 1.0];
        let (b1, b2) = solve_two_columns(&x, &x, &[-2.0, 0.0, 2.0]);
        assert!((b1 - 1.0).abs() < 1e-12);
        assert!((b2 - 1.0).abs() < 1e-12);
    }
}
