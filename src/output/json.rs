//! JSON output format

use std::io::Write;

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{CellValue, NumericSummary, Table};
use crate::pipeline::CleaningReport;

use super::{OutputFormatter, ReportContext};

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReportOutput<'a> {
    input: String,
    output: Option<String>,
    #[serde(flatten)]
    report: &'a CleaningReport,
    preview: Vec<IndexMap<&'a str, serde_json::Value>>,
    statistics: &'a [NumericSummary],
}

fn cell_value_to_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Null => serde_json::Value::Null,
        CellValue::Bool(b) => serde_json::Value::Bool(*b),
        CellValue::Int(i) => serde_json::json!(*i),
        CellValue::Float(f) => serde_json::json!(*f),
        CellValue::String(s) => serde_json::Value::String(s.to_string()),
        CellValue::Date(d) => serde_json::Value::String(d.to_string()),
        CellValue::DateTime(dt) => serde_json::Value::String(dt.to_string()),
    }
}

fn preview(table: &Table, rows: usize) -> Vec<IndexMap<&str, serde_json::Value>> {
    table
        .rows
        .iter()
        .take(rows)
        .map(|row| {
            table
                .columns
                .iter()
                .zip(&row.cells)
                .map(|(col, cell)| (col.name.as_str(), cell_value_to_json(cell)))
                .collect()
        })
        .collect()
}

impl OutputFormatter for JsonOutput {
    fn render(&self, context: &ReportContext<'_>, writer: &mut dyn Write) -> Result<()> {
        let output = JsonReportOutput {
            input: context.input.display().to_string(),
            output: context.output.map(|p| p.display().to_string()),
            report: context.report,
            preview: preview(context.table, context.preview_rows),
            statistics: context.statistics,
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_render_json() {
        let table = Table::from_rows(
            vec!["name", "age"],
            vec![
                vec!["alice".into(), CellValue::Int(30)],
                vec!["bob".into(), CellValue::Null],
            ],
        );
        let report = CleaningReport {
            overview: table.overview(),
            log: vec!["Dropped column `x`.".to_string()],
            ..Default::default()
        };
        let statistics = table.describe();
        let context = ReportContext {
            report: &report,
            table: &table,
            input: Path::new("in.csv"),
            output: None,
            preview_rows: 1,
            statistics: &statistics,
        };

        let mut out = Vec::new();
        JsonOutput::compact().render(&context, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["input"], "in.csv");
        assert!(value["output"].is_null());
        assert_eq!(value["log"][0], "Dropped column `x`.");
        assert_eq!(value["overview"][1]["missing"], 1);
        assert_eq!(value["overview"][1]["type"], "int");
        assert_eq!(value["preview"].as_array().unwrap().len(), 1);
        assert_eq!(value["preview"][0]["age"], 30);

        let age = &value["statistics"][0];
        assert_eq!(age["column"], "age");
        assert_eq!(age["count"], 1);
        assert_eq!(age["mean"], 30.0);
        assert!(age["std"].is_null());
        assert_eq!(age["50%"], 30.0);
        assert_eq!(age["max"], 30.0);
    }
}
