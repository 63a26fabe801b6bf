//! Configuration handling for datatidy

use std::path::{Path, PathBuf};

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::CaseStyle;
use crate::transform::{Operation, OperationKind, TransformationSpec};

/// Label meaning "leave this column alone"
pub const NO_CHANGE: &str = "No Change";

/// Output format for the cleaning report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Everything chosen for one cleaning request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Path to the file to clean
    #[serde(skip)]
    pub input: PathBuf,
    /// Where to write the cleaned table; derived from `input` when unset
    #[serde(skip)]
    pub output: Option<PathBuf>,
    /// Column header convention
    pub case_style: CaseStyle,
    /// Column to operation label, applied in insertion order
    pub transformations: IndexMap<String, String>,
    /// Patterns for columns using regex cleaning
    pub regex_patterns: IndexMap<String, String>,
    /// Remove every row with a missing value
    pub drop_missing: bool,
    /// Conditional row filter expression
    pub filter: Option<String>,
    /// Append an anomaly label column
    pub flag_anomalies: bool,
    /// For Excel files: which sheet to read
    pub sheet_name: Option<String>,
    /// Rows shown in the report preview
    pub preview_rows: usize,
    /// Report format
    pub output_format: OutputFormat,
    /// Clean and report without writing the output file
    pub dry_run: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            case_style: CaseStyle::default(),
            transformations: IndexMap::new(),
            regex_patterns: IndexMap::new(),
            drop_missing: false,
            filter: None,
            flag_anomalies: false,
            sheet_name: None,
            preview_rows: 10,
            output_format: OutputFormat::default(),
            dry_run: false,
        }
    }
}

impl CleanConfig {
    /// Create a new CleanConfig for an input file
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            ..Default::default()
        }
    }

    /// Load a JSON request file; paths are not part of the request
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid request file: {}", path.display()))
    }

    /// Set output path
    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }

    /// Set column header convention
    pub fn with_case_style(mut self, style: CaseStyle) -> Self {
        self.case_style = style;
        self
    }

    /// Choose the operation for a column by label or slug
    pub fn with_operation(mut self, column: impl Into<String>, operation: impl Into<String>) -> Self {
        self.transformations.insert(column.into(), operation.into());
        self
    }

    /// Set the pattern used when `column` is regex cleaned
    pub fn with_regex_pattern(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.regex_patterns.insert(column.into(), pattern.into());
        self
    }

    pub fn with_drop_missing(mut self, drop: bool) -> Self {
        self.drop_missing = drop;
        self
    }

    /// Set the conditional row filter
    pub fn with_filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }

    pub fn with_flag_anomalies(mut self, flag: bool) -> Self {
        self.flag_anomalies = flag;
        self
    }

    /// Set Excel sheet name
    pub fn with_sheet_name(mut self, name: String) -> Self {
        self.sheet_name = Some(name);
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Compile the chosen operations into a [`TransformationSpec`].
    ///
    /// Columns set to "No Change" are skipped. Fails on an unknown label or
    /// a regex that does not compile.
    pub fn build_spec(&self) -> Result<TransformationSpec> {
        let mut spec = TransformationSpec::new();
        for (column, label) in &self.transformations {
            if label.trim().eq_ignore_ascii_case(NO_CHANGE) || label.trim().eq_ignore_ascii_case("no-change") {
                continue;
            }
            let kind: OperationKind = label.parse()?;
            let pattern = self.regex_patterns.get(column).map(String::as_str);
            spec.insert(column.clone(), Operation::new(kind, column, pattern)?);
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleanError;

    #[test]
    fn test_build_spec_keeps_order_and_skips_no_change() {
        let config = CleanConfig::default()
            .with_operation("b", "Title Case")
            .with_operation("skip", "No Change")
            .with_operation("a", "regex-clean")
            .with_regex_pattern("a", "[0-9]+");

        let spec = config.build_spec().unwrap();
        let ops: Vec<(&str, String)> = spec.iter().map(|(c, op)| (c, op.to_string())).collect();
        assert_eq!(
            ops,
            vec![
                ("b", "Title Case".to_string()),
                ("a", "Regex Clean ([0-9]+)".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_spec_errors() {
        let config = CleanConfig::default().with_operation("a", "Shout");
        assert!(matches!(config.build_spec(), Err(CleanError::UnknownOperation(_))));

        let config = CleanConfig::default()
            .with_operation("a", "Regex Clean")
            .with_regex_pattern("a", "(");
        assert!(matches!(config.build_spec(), Err(CleanError::InvalidPattern { .. })));
    }

    #[test]
    fn test_deserialize_request() {
        let config: CleanConfig = serde_json::from_str(
            r#"{
                "case_style": "snake_case",
                "transformations": {"full_name": "Title Case", "age": "fill-mean"},
                "drop_missing": true,
                "filter": "age > 30"
            }"#,
        )
        .unwrap();

        assert_eq!(config.case_style, CaseStyle::Snake);
        assert_eq!(config.transformations.keys().collect::<Vec<_>>(), vec!["full_name", "age"]);
        assert!(config.drop_missing);
        assert_eq!(config.filter.as_deref(), Some("age > 30"));
        assert_eq!(config.preview_rows, 10);
        assert!(!config.flag_anomalies);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
