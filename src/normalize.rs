//! Column name normalization (snake_case / camelCase)

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CleanError, Result};
use crate::model::Table;

/// Naming convention applied to column headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStyle {
    #[serde(rename = "snake_case", alias = "snake")]
    Snake,
    #[serde(rename = "camelCase", alias = "camel")]
    Camel,
    #[default]
    #[serde(rename = "unchanged", alias = "No Change")]
    Unchanged,
}

impl std::str::FromStr for CaseStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snake" | "snake_case" => Ok(CaseStyle::Snake),
            "camel" | "camelcase" => Ok(CaseStyle::Camel),
            "unchanged" | "no change" | "none" => Ok(CaseStyle::Unchanged),
            _ => Err(format!("Unknown case style: {}", s)),
        }
    }
}

impl std::fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStyle::Snake => write!(f, "snake_case"),
            CaseStyle::Camel => write!(f, "camelCase"),
            CaseStyle::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// A header that changed during normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// Rewrite every column name of `table` in `style`.
///
/// Row data is untouched. Names that collide after rewriting are
/// disambiguated with a numeric suffix; the first occurrence keeps the bare
/// name. A name that is blank after trimming is rejected and the table is
/// left as it was.
pub fn normalize_columns(table: &mut Table, style: CaseStyle) -> Result<Vec<Rename>> {
    if style == CaseStyle::Unchanged {
        return Ok(Vec::new());
    }

    let mut names = Vec::with_capacity(table.column_count());
    for (index, column) in table.columns.iter().enumerate() {
        let name = normalize_name(&column.name, style);
        if name.is_empty() {
            return Err(CleanError::EmptyColumnName { index });
        }
        names.push(name);
    }

    let names = disambiguate(names, style);

    let mut renames = Vec::new();
    for (column, name) in table.columns.iter_mut().zip(names) {
        if column.name != name {
            debug!(from = %column.name, to = %name, "renamed column");
            renames.push(Rename {
                from: std::mem::replace(&mut column.name, name.clone()),
                to: name,
            });
        }
    }

    Ok(renames)
}

/// Normalize a single column name; may return an empty string
pub fn normalize_name(name: &str, style: CaseStyle) -> String {
    match style {
        CaseStyle::Snake => to_snake_case(name),
        CaseStyle::Camel => to_camel_case(name),
        CaseStyle::Unchanged => name.to_string(),
    }
}

/// Make names unique, keeping the first occurrence of each name bare.
pub fn disambiguate(names: Vec<String>, style: CaseStyle) -> Vec<String> {
    let separator = match style {
        CaseStyle::Camel => "",
        CaseStyle::Snake | CaseStyle::Unchanged => "_",
    };

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let mut candidate = name.clone();
        let mut count = 1;
        while seen.contains(&candidate) {
            count += 1;
            candidate = format!("{}{}{}", name, separator, count);
        }
        if candidate != name {
            warn!(column = %name, renamed = %candidate, "column name collision");
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

fn to_snake_case(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

fn to_camel_case(name: &str) -> String {
    let mut words = name.split_whitespace().flat_map(split_humps);

    let mut out = match words.next() {
        Some(first) => first.to_lowercase(),
        None => return String::new(),
    };

    // Every capital must follow a non-capital, or the next pass splits differently
    for word in words {
        if out.chars().last().is_some_and(char::is_uppercase) {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }

    out
}

/// Split before an uppercase letter that follows a non-uppercase character
fn split_humps(word: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_upper = true;

    for (i, c) in word.char_indices() {
        if c.is_uppercase() && !prev_upper && i > start {
            parts.push(&word[start..i]);
            start = i;
        }
        prev_upper = c.is_uppercase();
    }
    parts.push(&word[start..]);

    parts
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut upper = first.to_uppercase();
    let head = match (upper.next(), upper.next()) {
        (Some(u), None) => u.to_string(),
        _ => first.to_lowercase().to_string(),
    };

    head + &chars.as_str().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn table_with(headers: Vec<&str>) -> Table {
        let row = headers.iter().map(|_| CellValue::Int(1)).collect();
        Table::from_rows(headers, vec![row])
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(normalize_name("Full Name ", CaseStyle::Snake), "full_name");
        assert_eq!(normalize_name("  Order\t\tDate  ", CaseStyle::Snake), "order_date");
        assert_eq!(normalize_name("ID", CaseStyle::Snake), "id");
        assert_eq!(normalize_name("   ", CaseStyle::Snake), "");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(normalize_name("Full Name ", CaseStyle::Camel), "fullName");
        assert_eq!(normalize_name("FULL NAME", CaseStyle::Camel), "fullName");
        assert_eq!(normalize_name("date of   birth", CaseStyle::Camel), "dateOfBirth");
        assert_eq!(normalize_name("fullName", CaseStyle::Camel), "fullName");
        assert_eq!(normalize_name("Revenue", CaseStyle::Camel), "revenue");
        assert_eq!(normalize_name("Grade A", CaseStyle::Camel), "gradeA");
        assert_eq!(normalize_name("Vitamin C", CaseStyle::Camel), "vitaminC");
        assert_eq!(normalize_name("a B C", CaseStyle::Camel), "aBc");
        assert_eq!(normalize_name("Grade A B", CaseStyle::Camel), "gradeAb");
        assert_eq!(normalize_name("Grade A Bc", CaseStyle::Camel), "gradeAbc");
    }

    #[test]
    fn test_camel_case_is_a_fixed_point() {
        for name in [
            "a B c",
            "x Y",
            "Total-Sales Q1",
            "unit price (usd)",
            "IDNumber",
            "Grade A",
            "Grade A B",
            "Grade A Bc",
            "a B C",
        ] {
            let once = normalize_name(name, CaseStyle::Camel);
            assert_eq!(normalize_name(&once, CaseStyle::Camel), once, "{}", name);
        }
    }

    #[test]
    fn test_unchanged_is_identity() {
        let mut table = table_with(vec!["Full Name ", "Age"]);
        let renames = normalize_columns(&mut table, CaseStyle::Unchanged).unwrap();
        assert!(renames.is_empty());
        assert_eq!(table.column_names(), vec!["Full Name ", "Age"]);
    }

    #[test]
    fn test_collisions_are_disambiguated() {
        let mut table = table_with(vec!["First Name", "first  name", "first_name_2"]);
        normalize_columns(&mut table, CaseStyle::Snake).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["first_name", "first_name_2", "first_name_2_2"]
        );
    }

    #[test]
    fn test_empty_name_is_rejected_without_changes() {
        let mut table = table_with(vec!["Good Name", "  "]);
        let err = normalize_columns(&mut table, CaseStyle::Snake).unwrap_err();
        assert!(matches!(err, CleanError::EmptyColumnName { index: 1 }));
        assert_eq!(table.column_names(), vec!["Good Name", "  "]);
    }

    #[test]
    fn test_renames_report_only_changes() {
        let mut table = table_with(vec!["age", "Full Name"]);
        let renames = normalize_columns(&mut table, CaseStyle::Snake).unwrap();
        assert_eq!(
            renames,
            vec![Rename {
                from: "Full Name".into(),
                to: "full_name".into()
            }]
        );
    }
}
