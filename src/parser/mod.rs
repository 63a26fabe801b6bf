//! Parser layer for reading tabular data formats

mod csv;
mod excel;

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::CleanConfig;
use crate::model::{Column, Table};
use crate::normalize::{disambiguate, CaseStyle};

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table
    fn parse(&self, path: &Path, config: &CleanConfig) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CsvParser), Box::new(ExcelParser)],
        }
    }

    /// Get a parser for the given file path
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = input_format(path);

        for parser in &self.parsers {
            if parser.supports_extension(&ext) {
                return Ok(parser.as_ref());
            }
        }

        bail!(
            "Unsupported file format: {}",
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
        )
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, config: &CleanConfig) -> Result<Table> {
        let parser = self.get_parser(path)?;
        parser.parse(path, config)
    }
}

/// Lowercased extension of `path`, or the sniffed format when it has none
pub fn input_format(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_lowercase(),
        None => detect_format(path).unwrap_or_default().to_string(),
    }
}

/// Detect file format from content (for files without extension)
pub fn detect_format(path: &Path) -> Option<&'static str> {
    use std::fs::File;
    use std::io::Read;

    let mut file = File::open(path).ok()?;
    let mut buffer = [0u8; 4];
    file.read_exact(&mut buffer).ok()?;

    match &buffer {
        b"PK\x03\x04" => Some("xlsx"),
        b"\xD0\xCF\x11\xE0" => Some("xls"),
        _ => Some("csv"),
    }
}

/// Build header columns: blank names become `ColumnN`, repeats get `_2`, `_3`, ...
pub(crate) fn header_columns<I>(names: I) -> Vec<Column>
where
    I: IntoIterator<Item = String>,
{
    let names: Vec<String> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.trim().is_empty() {
                format!("Column{}", i + 1)
            } else {
                name
            }
        })
        .collect();

    disambiguate(names, CaseStyle::Unchanged)
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect()
}
