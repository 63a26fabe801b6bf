//! CSV file parser

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::CleanConfig;
use crate::model::{CellValue, Table};

use super::{header_columns, Parser};

/// Parser for CSV files
pub struct CsvParser;

impl CsvParser {
    /// Parse CSV from any reader; `.tsv` paths use a tab delimiter
    pub fn parse_reader<R: Read>(&self, reader: R, delimiter: u8) -> Result<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .clone();

        let mut table = Table::new(header_columns(headers.iter().map(str::to_string)));

        for (line_num, result) in csv_reader.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read CSV row {}", line_num + 2))?; // +2 for 1-indexing and header

            let cells: Vec<CellValue> = record
                .iter()
                .take(table.column_count())
                .map(parse_cell_value)
                .collect();

            table.add_row(cells, line_num + 2);
        }

        table.refresh_types();
        Ok(table)
    }
}

impl Parser for CsvParser {
    fn parse(&self, path: &Path, _config: &CleanConfig) -> Result<Table> {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };
        self.parse_reader(BufReader::new(file), delimiter)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

/// Parse a field into a CellValue with type inference; text keeps its whitespace
fn parse_cell_value(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }

    let trimmed = s.trim();

    // Check for null markers
    if trimmed.eq_ignore_ascii_case("null") || trimmed == "NA" || trimmed == "NaN" {
        return CellValue::Null;
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return CellValue::Date(date);
    }

    // Try parsing as datetime (ISO 8601)
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return CellValue::DateTime(dt);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return CellValue::DateTime(dt);
    }

    CellValue::String(Cow::Owned(s.to_string()))
}
