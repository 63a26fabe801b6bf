//! Anomaly flagging over the numeric columns of a cleaned table

use tracing::debug;

use crate::model::stats::{mean, percentile};
use crate::model::{CellValue, Table};

/// Label for a row judged anomalous
pub const ANOMALY: i8 = -1;
/// Label for a row judged normal
pub const NORMAL: i8 = 1;

/// Name of the appended label column
pub const ANOMALY_COLUMN: &str = "anomaly";

/// Outlier detector; returns [`ANOMALY`] or [`NORMAL`] for each input row
pub trait AnomalyDetector {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Vec<i8>;
}

/// Isolation Forest (Liu, Ting & Zhou 2008)
#[derive(Debug, Clone)]
pub struct IsolationForest {
    pub n_trees: usize,
    pub sample_size: usize,
    /// Expected share of anomalies, used to place the decision threshold
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_trees: 100,
            sample_size: 256,
            contamination: 0.05,
            seed: 42,
        }
    }
}

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl IsolationForest {
    /// Anomaly score in (0, 1] per row; higher is more anomalous
    pub fn score(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let n = data.len();
        if n == 0 {
            return Vec::new();
        }

        let mut rng = fastrand::Rng::with_seed(self.seed);
        let psi = self.sample_size.clamp(1, n);
        let max_depth = (psi as f64).log2().ceil() as usize;

        let mut indices: Vec<usize> = (0..n).collect();
        let trees: Vec<Node> = (0..self.n_trees.max(1))
            .map(|_| {
                rng.shuffle(&mut indices);
                build(&mut rng, data, indices[..psi].to_vec(), 0, max_depth)
            })
            .collect();

        let norm = average_path(psi).max(f64::EPSILON);
        data.iter()
            .map(|x| {
                let mean_depth =
                    trees.iter().map(|t| path_length(t, x, 0)).sum::<f64>() / trees.len() as f64;
                2f64.powf(-mean_depth / norm)
            })
            .collect()
    }
}

impl AnomalyDetector for IsolationForest {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Vec<i8> {
        let scores = self.score(data);
        if scores.is_empty() {
            return Vec::new();
        }

        let mut sorted = scores.clone();
        sorted.sort_by(f64::total_cmp);
        let cutoff = percentile(&sorted, 1.0 - self.contamination.clamp(0.0, 0.5));

        scores
            .iter()
            .map(|&s| if s > cutoff { ANOMALY } else { NORMAL })
            .collect()
    }
}

fn build(rng: &mut fastrand::Rng, data: &[Vec<f64>], rows: Vec<usize>, depth: usize, max_depth: usize) -> Node {
    if depth >= max_depth || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    let features = data[rows[0]].len();
    let spread: Vec<(usize, f64, f64)> = (0..features)
        .filter_map(|f| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                (lo.min(data[r][f]), hi.max(data[r][f]))
            });
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();

    if spread.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, lo, hi) = spread[rng.usize(..spread.len())];
    let threshold = lo + rng.f64() * (hi - lo);
    let (left, right): (Vec<usize>, Vec<usize>) = rows.into_iter().partition(|&r| data[r][feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build(rng, data, left, depth + 1, max_depth)),
        right: Box::new(build(rng, data, right, depth + 1, max_depth)),
    }
}

fn path_length(node: &Node, x: &[f64], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if x[*feature] < *threshold {
                path_length(left, x, depth + 1)
            } else {
                path_length(right, x, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points
fn average_path(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + 0.577_215_664_9) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Run `detector` over the numeric columns and append an `anomaly` label column.
///
/// Missing numeric values are replaced by their column mean for scoring
/// only. Returns the cleaning log entry.
pub fn flag_anomalies(table: &mut Table, detector: &dyn AnomalyDetector) -> String {
    let numeric: Vec<usize> = table
        .columns
        .iter()
        .filter(|c| c.inferred_type.is_numeric())
        .map(|c| c.index)
        .collect();

    if numeric.is_empty() || table.row_count() == 0 {
        return "Skipped anomaly detection: no numeric data.".to_string();
    }

    let means: Vec<f64> = numeric
        .iter()
        .map(|&i| {
            let values: Vec<f64> = table.column_values(i).filter_map(CellValue::as_f64).collect();
            mean(&values).unwrap_or(0.0)
        })
        .collect();

    let data: Vec<Vec<f64>> = table
        .rows
        .iter()
        .map(|row| {
            numeric
                .iter()
                .zip(&means)
                .map(|(&i, &mean)| row.get(i).and_then(CellValue::as_f64).unwrap_or(mean))
                .collect()
        })
        .collect();

    let labels = detector.fit_predict(&data);
    let flagged = labels.iter().filter(|&&l| l == ANOMALY).count();

    let names: Vec<String> = numeric.iter().map(|&i| table.columns[i].name.clone()).collect();
    let column = unused_name(table, ANOMALY_COLUMN);
    debug!(%column, flagged, rows = table.row_count(), "anomaly labels computed");

    table.push_column(
        column.clone(),
        labels.into_iter().map(|l| CellValue::Int(i64::from(l))).collect(),
    );

    format!(
        "Flagged {} of {} rows as anomalies in `{}` using: {}",
        flagged,
        table.row_count(),
        column,
        names.join(", ")
    )
}

fn unused_name(table: &Table, base: &str) -> String {
    let mut candidate = base.to_string();
    let mut count = 1;
    while table.column_index(&candidate).is_some() {
        count += 1;
        candidate = format!("{}_{}", base, count);
    }
    candidate
}
