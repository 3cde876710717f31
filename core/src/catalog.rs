use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Food energy lookup. Implementations only need exact name matching.
pub trait NutritionCatalog {
    /// Calories per 100 g, or `None` when the food is unknown.
    fn lookup(&self, food: &str) -> Option<f64>;
}

/// Calories for `grams` of `food`, if the catalog knows it.
pub fn calories_for(catalog: &dyn NutritionCatalog, food: &str, grams: f64) -> Option<f64> {
    catalog.lookup(food).map(|per_100g| per_100g / 100.0 * grams)
}

/// A catalog loaded from a `Food,Calories` CSV table.
///
/// Names match case-insensitively after trimming.
#[derive(Debug, Clone, Default)]
pub struct CsvCatalog {
    foods: HashMap<String, f64>,
}

impl CsvCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open food table: {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to read food table: {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
        let col =
            |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };
        let Some(idx_food) = col("Food") else {
            bail!("Missing required column: Food");
        };
        let Some(idx_cal) = col("Calories") else {
            bail!("Missing required column: Calories");
        };

        let mut foods = HashMap::new();
        for (line_num, result) in rdr.records().enumerate() {
            let record =
                result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;
            let name = record.get(idx_food).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let Some(calories) = record
                .get(idx_cal)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|c| c.is_finite() && *c >= 0.0)
            else {
                continue;
            };
            // First entry wins, like a top-down table lookup.
            foods.entry(name.to_lowercase()).or_insert(calories);
        }

        Ok(Self { foods })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }
}

impl NutritionCatalog for CsvCatalog {
    fn lookup(&self, food: &str) -> Option<f64> {
        self.foods.get(&food.trim().to_lowercase()).copied()
    }
}
