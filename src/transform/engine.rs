//! Transformation engine that applies per-column operations to a table.

use std::borrow::Cow;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::{CleanError, Result};
use crate::model::stats::mean;
use crate::model::{CellValue, Table};

use super::dates::parse_date_cell;
use super::operations::{Operation, TransformationSpec};

/// Engine for applying a transformation spec to a table.
#[derive(Debug, Default)]
pub struct TransformationEngine;

impl TransformationEngine {
    /// Create a new transformation engine.
    pub fn new() -> Self {
        Self
    }

    /// Apply every operation of `spec` in insertion order.
    ///
    /// Each operation sees the table as left by the previous ones, so a
    /// duplicate removal on one column shrinks the rows every later
    /// operation works on. Returns the cleaning log entries.
    pub fn apply(&self, table: &mut Table, spec: &TransformationSpec) -> Result<Vec<String>> {
        if let Some((missing, _)) = spec.iter().find(|(c, _)| table.column_index(c).is_none()) {
            return Err(CleanError::UnknownColumn(missing.to_string()));
        }

        let mut log = Vec::new();
        for (column, operation) in spec.iter() {
            debug!(%column, %operation, rows = table.row_count(), "applying operation");
            if let Some(entry) = self.apply_operation(table, column, operation) {
                log.push(entry);
            }
        }

        Ok(log)
    }

    /// Apply a single operation; returns a log entry when it has one.
    pub fn apply_operation(&self, table: &mut Table, column: &str, operation: &Operation) -> Option<String> {
        let index = table.column_index(column)?;

        match operation {
            Operation::TitleCase => {
                cast_text(table, index, |s| Cow::Owned(title_case(s)));
                None
            }
            Operation::UpperCase => {
                cast_text(table, index, |s| Cow::Owned(s.to_uppercase()));
                None
            }
            Operation::LowerCase => {
                cast_text(table, index, |s| Cow::Owned(s.to_lowercase()));
                None
            }
            Operation::DateFormat => {
                let mut failed = 0;
                table.map_column(index, |cell| {
                    if cell.is_null() {
                        return;
                    }
                    *cell = parse_date_cell(cell).unwrap_or_else(|| {
                        failed += 1;
                        CellValue::Null
                    });
                });
                Some(format!(
                    "Parsed `{}` as dates; {} value(s) could not be parsed.",
                    column, failed
                ))
            }
            Operation::RemoveSpaces => {
                edit_text(table, index, |s| Cow::Borrowed(s.trim()));
                None
            }
            Operation::RemoveDuplicates => {
                let mut seen: FxHashSet<CellValue> = FxHashSet::default();
                let removed = table.retain_rows(|row| {
                    let value = row.get(index).cloned().unwrap_or(CellValue::Null);
                    seen.insert(value)
                });
                Some(format!(
                    "Removed {} duplicate rows based on `{}`.",
                    removed, column
                ))
            }
            Operation::FillMissingMean => fill_missing(table, index, column, Statistic::Mean),
            Operation::FillMissingMedian => fill_missing(table, index, column, Statistic::Median),
            Operation::RemoveSpecialCharacters => {
                edit_text(table, index, |s| {
                    if s.chars().all(|c| c.is_alphanumeric() || c.is_whitespace()) {
                        Cow::Borrowed(s)
                    } else {
                        Cow::Owned(
                            s.chars()
                                .filter(|c| c.is_alphanumeric() || c.is_whitespace())
                                .collect(),
                        )
                    }
                });
                None
            }
            Operation::DropColumn => {
                table.drop_column(column);
                Some(format!("Dropped column `{}`.", column))
            }
            Operation::RegexClean { pattern } => {
                edit_text(table, index, |s| pattern.replace_all(s, ""));
                Some(format!(
                    "Applied regex cleaning to `{}` with pattern: `{}`",
                    column,
                    pattern.as_str()
                ))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Statistic {
    Mean,
    Median,
}

/// Render every non-missing cell as text and transform it
fn cast_text<F>(table: &mut Table, index: usize, f: F)
where
    F: Fn(&str) -> Cow<'_, str>,
{
    table.map_column(index, |cell| {
        if cell.is_null() {
            return;
        }
        let text = cell.to_field().into_owned();
        *cell = CellValue::from(f(&text).into_owned());
    });
}

/// Transform String cells only; other types are left as they are
fn edit_text<F>(table: &mut Table, index: usize, f: F)
where
    F: Fn(&str) -> Cow<'_, str>,
{
    table.map_column(index, |cell| {
        if let CellValue::String(s) = cell {
            let edited = match f(s) {
                Cow::Borrowed(b) if b.len() == s.len() => return,
                other => other.into_owned(),
            };
            *cell = CellValue::from(edited);
        }
    });
}

fn fill_missing(table: &mut Table, index: usize, column: &str, statistic: Statistic) -> Option<String> {
    if !table.columns[index].inferred_type.is_numeric() {
        debug!(%column, "skipping imputation of non-numeric column");
        return None;
    }

    let mut values: Vec<f64> = table.column_values(index).filter_map(CellValue::as_f64).collect();
    let (label, fill) = match statistic {
        Statistic::Mean => ("mean", mean(&values)?),
        Statistic::Median => ("median", median(&mut values)?),
    };

    let mut filled = 0;
    table.map_column(index, |cell| {
        if cell.is_null() {
            *cell = CellValue::Float(fill);
            filled += 1;
        }
    });

    Some(format!(
        "Filled {} missing values in `{}` with {}: {:.2}",
        filled, column, label, fill
    ))
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Uppercase the first cased letter of each word and lowercase the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;

    for c in s.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = c.is_alphabetic();
    }

    out
}
