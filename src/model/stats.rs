//! Column overviews and summary statistics

use serde::{Deserialize, Serialize};

use super::schema::CellType;
use super::table::{CellValue, Table};

/// Name, inferred type and missing count of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub inferred_type: CellType,
    pub missing: usize,
}

/// `describe`-style statistics for one numeric column.
///
/// `count` is the number of present values; the other figures are `None`
/// when there are none (and `std` also with a single value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1)
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q1: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    fn of(column: &str, mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        let mean = mean(&values);
        let std = match (mean, values.len()) {
            (Some(m), n) if n > 1 => {
                let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
                Some((ss / (n - 1) as f64).sqrt())
            }
            _ => None,
        };
        let quantile = |q| (!values.is_empty()).then(|| percentile(&values, q));

        Self {
            column: column.to_string(),
            count: values.len(),
            mean,
            std,
            min: values.first().copied(),
            q1: quantile(0.25),
            median: quantile(0.5),
            q3: quantile(0.75),
            max: values.last().copied(),
        }
    }

    /// Figures in display order, labelled as `describe` labels them
    pub fn rows(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q1),
            ("50%", self.median),
            ("75%", self.q3),
            ("max", self.max),
        ]
    }
}

impl Table {
    /// One summary per column, in column order
    pub fn overview(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .zip(self.missing_counts())
            .map(|(col, missing)| ColumnSummary {
                name: col.name.clone(),
                inferred_type: col.inferred_type,
                missing,
            })
            .collect()
    }

    /// Statistics for every Int or Float column; empty when there are none
    pub fn describe(&self) -> Vec<NumericSummary> {
        self.columns
            .iter()
            .filter(|c| c.inferred_type.is_numeric())
            .map(|c| {
                let values = self.column_values(c.index).filter_map(CellValue::as_f64).collect();
                NumericSummary::of(&c.name, values)
            })
            .collect()
    }
}

/// Arithmetic mean; `None` for no values
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolated quantile of non-empty ascending `sorted`, `q` in [0, 1]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
