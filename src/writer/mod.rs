//! Writer layer for serializing cleaned tables

mod csv;
mod excel;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::model::Table;

pub use self::csv::CsvWriter;
pub use self::excel::ExcelWriter;

/// Trait for serializing a table into one file format
pub trait Writer: Send + Sync {
    /// Serialize the whole table into memory
    fn to_bytes(&self, table: &Table) -> Result<Vec<u8>>;

    /// Extension of files this writer produces
    fn extension(&self) -> &'static str;

    /// Check if this writer can produce the given file extension
    fn supports_extension(&self, ext: &str) -> bool;

    /// Write the table to `path`
    fn write(&self, table: &Table, path: &Path) -> Result<()> {
        let bytes = self.to_bytes(table)?;
        std::fs::write(path, bytes).with_context(|| format!("Failed to write file: {}", path.display()))
    }
}

/// Factory for choosing a writer by file extension
pub struct WriterFactory {
    writers: Vec<Box<dyn Writer>>,
}

impl Default for WriterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WriterFactory {
    pub fn new() -> Self {
        Self {
            writers: vec![
                Box::new(CsvWriter::new(b',')),
                Box::new(CsvWriter::new(b'\t')),
                Box::new(ExcelWriter),
            ],
        }
    }

    /// Get a writer for the given extension; spreadsheet inputs map to xlsx
    pub fn get_writer(&self, ext: &str) -> Result<&dyn Writer> {
        let ext = match ext.to_lowercase().as_str() {
            "xlsm" | "xlsb" | "xls" | "ods" => "xlsx".to_string(),
            "txt" => "csv".to_string(),
            other => other.to_string(),
        };

        for writer in &self.writers {
            if writer.supports_extension(&ext) {
                return Ok(writer.as_ref());
            }
        }

        bail!("Unsupported output format: {}", ext)
    }

    /// Writer matching the file family of `path`
    pub fn for_path(&self, path: &Path) -> Result<&dyn Writer> {
        self.get_writer(path.extension().and_then(|e| e.to_str()).unwrap_or("csv"))
    }

    /// Serialize `table` in the format of `ext` into a byte buffer
    pub fn to_bytes(&self, table: &Table, ext: &str) -> Result<Vec<u8>> {
        self.get_writer(ext)?.to_bytes(table)
    }

    /// Write `table` to `path` in the format its extension names
    pub fn write(&self, table: &Table, path: &Path) -> Result<()> {
        self.for_path(path)?.write(table, path)
    }
}

/// `data.csv` -> `data_cleaned.csv`, `book.xls` -> `book_cleaned.xlsx`.
///
/// `format` is the format the input was read as (see
/// [`input_format`](crate::parser::input_format)), so sniffed inputs keep
/// their family.
pub fn default_output_path(input: &Path, format: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("cleaned_data");
    let ext = match format.to_lowercase().as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => "xlsx",
        "tsv" => "tsv",
        _ => "csv",
    };
    input.with_file_name(format!("{}_cleaned.{}", stem, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/people.csv"), "csv"),
            PathBuf::from("/data/people_cleaned.csv")
        );
        assert_eq!(
            default_output_path(Path::new("book.XLS"), "XLS"),
            PathBuf::from("book_cleaned.xlsx")
        );
        assert_eq!(default_output_path(Path::new("raw"), "csv"), PathBuf::from("raw_cleaned.csv"));
        assert_eq!(default_output_path(Path::new("export"), "xlsx"), PathBuf::from("export_cleaned.xlsx"));
    }

    #[test]
    fn test_get_writer() {
        let factory = WriterFactory::new();
        assert_eq!(factory.get_writer("ods").unwrap().extension(), "xlsx");
        assert_eq!(factory.get_writer("TSV").unwrap().extension(), "tsv");
        assert!(factory.get_writer("parquet").is_err());
    }
}
