//! Cleaning pipeline: normalize, transform, then the whole-table steps

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::anomaly::{flag_anomalies, AnomalyDetector, IsolationForest};
use crate::config::CleanConfig;
use crate::error::{CleanError, Result};
use crate::filter::RowFilter;
use crate::model::{ColumnSummary, Table};
use crate::normalize::{normalize_columns, CaseStyle, Rename};
use crate::transform::TransformationEngine;

/// Row and column counts of a table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    pub rows: usize,
    pub columns: usize,
}

impl TableShape {
    pub fn of(table: &Table) -> Self {
        Self {
            rows: table.row_count(),
            columns: table.column_count(),
        }
    }
}

impl std::fmt::Display for TableShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} rows x {} columns", self.rows, self.columns)
    }
}

/// What one cleaning request did
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Shape as loaded
    pub before: TableShape,
    /// Shape after every step
    pub after: TableShape,
    /// Column types and missing counts as loaded
    pub overview: Vec<ColumnSummary>,
    /// Column headers changed by normalization
    pub renames: Vec<Rename>,
    /// Cleaning log, in the order the effects happened
    pub log: Vec<String>,
    /// Steps that failed softly and were skipped
    pub warnings: Vec<String>,
}

impl CleaningReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Runs every configured step over a table
pub struct Pipeline {
    config: CleanConfig,
    engine: TransformationEngine,
    detector: Box<dyn AnomalyDetector>,
}

impl Pipeline {
    /// Create a pipeline using the default anomaly detector
    pub fn new(config: CleanConfig) -> Self {
        Self {
            config,
            engine: TransformationEngine::new(),
            detector: Box::new(IsolationForest::default()),
        }
    }

    /// Replace the anomaly detector
    pub fn with_detector(mut self, detector: Box<dyn AnomalyDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Clean `table` in place.
    ///
    /// Request errors (empty table, unknown operation or column, bad regex,
    /// blank header) are returned before the table is changed. A failing
    /// filter expression only produces a warning.
    pub fn clean(&self, table: &mut Table) -> Result<CleaningReport> {
        if table.is_empty() {
            return Err(CleanError::EmptyTable);
        }

        let spec = self.config.build_spec()?;
        let mut report = CleaningReport {
            before: TableShape::of(table),
            overview: table.overview(),
            ..Default::default()
        };

        let original_columns = table.columns.clone();
        report.renames = normalize_columns(table, self.config.case_style)?;
        if self.config.case_style != CaseStyle::Unchanged {
            info!(style = %self.config.case_style, renamed = report.renames.len(), "normalized column names");
        }

        match self.engine.apply(table, &spec) {
            Ok(entries) => report.log.extend(entries),
            Err(e) => {
                table.columns = original_columns;
                return Err(e);
            }
        }
        info!(operations = spec.len(), rows = table.row_count(), "applied transformations");

        if self.config.drop_missing {
            let dropped = table.retain_rows(|row| !row.has_missing());
            info!(dropped, "dropped rows with missing values");
            report.log.push(format!("Dropped {} rows with missing values.", dropped));
        }

        if let Some(expression) = self.config.filter.as_deref().filter(|e| !e.trim().is_empty()) {
            self.filter(table, expression, &mut report);
        }

        if self.config.flag_anomalies {
            let entry = flag_anomalies(table, self.detector.as_ref());
            info!("{}", entry);
            report.log.push(entry);
        }

        report.after = TableShape::of(table);
        Ok(report)
    }

    fn filter(&self, table: &mut Table, expression: &str, report: &mut CleaningReport) {
        let outcome = RowFilter::parse(expression).and_then(|filter| filter.apply(table).map(|removed| (filter, removed)));

        match outcome {
            Ok((filter, removed)) => {
                info!(%filter, removed, "applied row filter");
                report.log.push(format!("Applied row filter: `{}`", filter));
            }
            Err(e) => {
                let message = CleanError::from(e).to_string();
                warn!(%expression, "{}", message);
                report.warnings.push(message);
            }
        }
    }
}

/// Convenience function to clean a table with the default detector
pub fn clean_table(table: &mut Table, config: &CleanConfig) -> Result<CleaningReport> {
    Pipeline::new(config.clone()).clean(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn people() -> Table {
        Table::from_rows(
            vec!["Full Name ", "Age", "City"],
            vec![
                vec!["bob smith".into(), CellValue::Int(25), "Oslo".into()],
                vec!["ALICE jones".into(), CellValue::Null, "Rome".into()],
                vec!["carol king".into(), CellValue::Int(35), CellValue::Null],
                vec!["bob smith".into(), CellValue::Int(52), "Oslo".into()],
            ],
        )
    }

    #[test]
    fn test_full_request() {
        let config = CleanConfig::default()
            .with_case_style(CaseStyle::Snake)
            .with_operation("full_name", "Title Case")
            .with_operation("age", "Fill Missing (Mean)")
            .with_drop_missing(true)
            .with_filter("age < 50");

        let mut table = people();
        let report = clean_table(&mut table, &config).unwrap();

        assert_eq!(table.column_names(), vec!["full_name", "age", "city"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].cells[0], CellValue::from("Bob Smith"));
        assert_eq!(table.rows[1].cells[0], CellValue::from("Alice Jones"));
        assert_eq!(table.rows[1].cells[1], CellValue::Float(112.0 / 3.0));

        assert_eq!(report.before, TableShape { rows: 4, columns: 3 });
        assert_eq!(report.after, TableShape { rows: 2, columns: 3 });
        assert_eq!(report.renames.len(), 3);
        assert_eq!(report.overview[0].name, "Full Name ");
        assert_eq!(report.overview[1].missing, 1);
        assert_eq!(report.overview[2].missing, 1);
        assert_eq!(
            report.log,
            vec![
                "Filled 1 missing values in `age` with mean: 37.33".to_string(),
                "Dropped 1 rows with missing values.".to_string(),
                "Applied row filter: `age < 50`".to_string(),
            ]
        );
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_filter_failure_is_a_warning() {
        let config = CleanConfig::default()
            .with_filter("Nope > 1")
            .with_operation("City", "Upper Case");
        let mut table = people();

        let report = clean_table(&mut table, &config).unwrap();

        assert_eq!(table.row_count(), 4);
        assert_eq!(table.rows[0].cells[2], CellValue::from("OSLO"));
        assert_eq!(report.warnings, vec!["Error in filter expression: unknown column 'Nope'"]);
        assert!(report.log.is_empty());
    }

    #[test]
    fn test_deep_filter_is_a_warning() {
        let deep = format!("{}Age > 30{}", "(".repeat(100_000), ")".repeat(100_000));
        let config = CleanConfig::default()
            .with_filter(deep)
            .with_operation("City", "Upper Case");
        let mut table = people();

        let report = clean_table(&mut table, &config).unwrap();

        assert_eq!(table.row_count(), 4);
        assert_eq!(table.rows[0].cells[2], CellValue::from("OSLO"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("expression nested too deeply"));
    }

    #[test]
    fn test_unknown_column_restores_names() {
        let config = CleanConfig::default()
            .with_case_style(CaseStyle::Snake)
            .with_operation("Full Name ", "Upper Case");
        let mut table = people();

        let err = clean_table(&mut table, &config).unwrap_err();

        assert!(matches!(err, CleanError::UnknownColumn(ref c) if c == "Full Name "));
        assert_eq!(table.column_names(), vec!["Full Name ", "Age", "City"]);
    }

    #[test]
    fn test_empty_table() {
        let mut table = Table::from_rows(vec!["a"], Vec::new());
        let err = clean_table(&mut table, &CleanConfig::default()).unwrap_err();
        assert!(matches!(err, CleanError::EmptyTable));
    }

    struct EveryOther;

    impl AnomalyDetector for EveryOther {
        fn fit_predict(&self, data: &[Vec<f64>]) -> Vec<i8> {
            (0..data.len()).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect()
        }
    }

    #[test]
    fn test_custom_detector() {
        let config = CleanConfig::default().with_flag_anomalies(true);
        let mut table = people();

        let report = Pipeline::new(config)
            .with_detector(Box::new(EveryOther))
            .clean(&mut table)
            .unwrap();

        assert_eq!(table.column_names(), vec!["Full Name ", "Age", "City", "anomaly"]);
        let labels: Vec<_> = table.column_values(3).cloned().collect();
        assert_eq!(
            labels,
            vec![CellValue::Int(1), CellValue::Int(-1), CellValue::Int(1), CellValue::Int(-1)]
        );
        assert_eq!(report.log, vec!["Flagged 2 of 4 rows as anomalies in `anomaly` using: Age"]);
    }
}
