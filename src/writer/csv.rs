//! CSV writer

use anyhow::{anyhow, Context, Result};

use crate::model::Table;

use super::Writer;

/// Writer for delimited text; a tab delimiter produces `.tsv`
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Writer for CsvWriter {
    fn to_bytes(&self, table: &Table) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer
            .write_record(table.column_names())
            .context("Failed to write CSV header")?;

        for row in &table.rows {
            let fields: Vec<_> = row.cells.iter().map(|c| c.to_field()).collect();
            writer
                .write_record(fields.iter().map(|f| f.as_bytes()))
                .with_context(|| format!("Failed to write CSV row from line {}", row.source_line))?;
        }

        writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))
    }

    fn extension(&self) -> &'static str {
        if self.delimiter == b'\t' {
            "tsv"
        } else {
            "csv"
        }
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case(self.extension())
    }
}
