//! Conditional row filter.
//!
//! A deliberately small expression language: comparisons between columns
//! and literals, joined with `and` / `or` / `not` and parentheses.
//!
//! ```text
//! age > 30 and gender == 'Male'
//! not (`Full Name` == null) || score >= 9.5
//! ```
//!
//! Comparisons involving a missing cell are false, except `!=` which is
//! true. Write `column == null` to select missing values.

mod lexer;
mod parser;

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::{CellValue, Row, Table};
use crate::transform::parse_date_str;

pub use lexer::CmpOp;
pub use parser::{Expr, Literal, Operand};

/// Errors raised while parsing or evaluating a filter expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("empty expression")]
    Empty,

    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("cannot compare {left} {op} {right}")]
    TypeMismatch {
        left: String,
        op: CmpOp,
        right: String,
    },

    #[error("'{0}' is not a boolean condition")]
    NotBoolean(String),
}

/// A parsed filter expression ready to run against a table
#[derive(Debug, Clone)]
pub struct RowFilter {
    source: String,
    expr: Expr,
}

impl RowFilter {
    /// Parse `source`; fails on syntax errors only
    pub fn parse(source: &str) -> Result<Self, FilterError> {
        Ok(Self {
            source: source.trim().to_string(),
            expr: parser::parse(source)?,
        })
    }

    /// Keep the rows matching the expression; returns how many were removed.
    ///
    /// Every row is evaluated before any is removed, so on error the table
    /// is exactly as it was.
    pub fn apply(&self, table: &mut Table) -> Result<usize, FilterError> {
        let mask = self.evaluate(table)?;
        let mut keep = mask.into_iter();
        Ok(table.retain_rows(|_| keep.next().unwrap_or(false)))
    }

    /// Evaluate the expression for every row without modifying the table
    pub fn evaluate(&self, table: &Table) -> Result<Vec<bool>, FilterError> {
        if let Some(missing) = self
            .expr
            .columns()
            .into_iter()
            .find(|c| table.column_index(c).is_none())
        {
            return Err(FilterError::UnknownColumn(missing.to_string()));
        }

        let context = Context { table };
        table
            .rows
            .iter()
            .map(|row| context.eval(&self.expr, row))
            .collect()
    }
}

impl std::fmt::Display for RowFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

struct Context<'a> {
    table: &'a Table,
}

impl Context<'_> {
    fn eval(&self, expr: &Expr, row: &Row) -> Result<bool, FilterError> {
        match expr {
            Expr::Or(clauses) => {
                for clause in clauses {
                    if self.eval(clause, row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expr::And(clauses) => {
                for clause in clauses {
                    if !self.eval(clause, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Not(inner) => Ok(!self.eval(inner, row)?),
            Expr::Truthy(operand) => match self.value(operand, row) {
                CellValue::Bool(b) => Ok(b),
                CellValue::Null => Ok(false),
                other => Err(FilterError::NotBoolean(other.display().into_owned())),
            },
            Expr::Compare { left, op, right } => {
                let explicit_null = is_null_literal(left) || is_null_literal(right);
                let l = self.value(left, row);
                let r = self.value(right, row);
                compare(&l, *op, &r, explicit_null)
            }
        }
    }

    fn value(&self, operand: &Operand, row: &Row) -> CellValue {
        match operand {
            Operand::Column(name) => self
                .table
                .column_index(name)
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or(CellValue::Null),
            Operand::Literal(Literal::Number(n)) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    CellValue::Int(*n as i64)
                } else {
                    CellValue::Float(*n)
                }
            }
            Operand::Literal(Literal::Text(s)) => CellValue::from(s.as_str()),
            Operand::Literal(Literal::Bool(b)) => CellValue::Bool(*b),
            Operand::Literal(Literal::Null) => CellValue::Null,
        }
    }
}

fn is_null_literal(operand: &Operand) -> bool {
    matches!(operand, Operand::Literal(Literal::Null))
}

fn compare(l: &CellValue, op: CmpOp, r: &CellValue, explicit_null: bool) -> Result<bool, FilterError> {
    if l.is_null() || r.is_null() {
        return match op {
            CmpOp::Eq if explicit_null => Ok(l.is_null() && r.is_null()),
            CmpOp::Ne if explicit_null => Ok(!(l.is_null() && r.is_null())),
            CmpOp::Ne => Ok(true),
            CmpOp::Eq => Ok(false),
            _ if explicit_null => Err(mismatch(l, op, r)),
            _ => Ok(false),
        };
    }

    match order(l, r) {
        Some(ordering) => Ok(match op {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
        }),
        None if comparable(l, r) => Ok(op == CmpOp::Ne),
        None => match op {
            CmpOp::Eq => Ok(false),
            CmpOp::Ne => Ok(true),
            _ => Err(mismatch(l, op, r)),
        },
    }
}

/// Same kind of value but unordered (NaN)
fn comparable(l: &CellValue, r: &CellValue) -> bool {
    l.as_f64().is_some() && r.as_f64().is_some()
}

fn order(l: &CellValue, r: &CellValue) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) {
        return a.partial_cmp(&b);
    }

    match (l, r) {
        (CellValue::String(a), CellValue::String(b)) => Some(a.cmp(b)),
        (CellValue::Bool(a), CellValue::Bool(b)) => Some(a.cmp(b)),
        _ => {
            let a = as_datetime(l)?;
            let b = as_datetime(r)?;
            Some(a.cmp(&b))
        }
    }
}

fn as_datetime(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::Date(d) => d.and_hms_opt(0, 0, 0),
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::String(s) => match parse_date_str(s)? {
            CellValue::Date(d) => d.and_hms_opt(0, 0, 0),
            CellValue::DateTime(dt) => Some(dt),
            _ => None,
        },
        _ => None,
    }
}

fn mismatch(l: &CellValue, op: CmpOp, r: &CellValue) -> FilterError {
    FilterError::TypeMismatch {
        left: l.cell_type().to_string(),
        op,
        right: r.cell_type().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn people() -> Table {
        Table::from_rows(
            vec!["Age", "Gender", "Joined", "Active"],
            vec![
                vec![
                    CellValue::Int(25),
                    "Male".into(),
                    CellValue::Date(NaiveDate::from_ymd_opt(2020, 1, 5).unwrap()),
                    CellValue::Bool(true),
                ],
                vec![
                    CellValue::Int(41),
                    "Female".into(),
                    CellValue::Date(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()),
                    CellValue::Bool(false),
                ],
                vec![
                    CellValue::Float(35.5),
                    "Male".into(),
                    CellValue::Null,
                    CellValue::Bool(true),
                ],
                vec![CellValue::Null, CellValue::Null, CellValue::Null, CellValue::Null],
            ],
        )
    }

    fn mask(source: &str) -> Vec<bool> {
        RowFilter::parse(source).unwrap().evaluate(&people()).unwrap()
    }

    #[test]
    fn test_numeric_and_string_comparisons() {
        assert_eq!(mask("Age > 30 and Gender == 'Male'"), vec![false, false, true, false]);
        assert_eq!(mask("Age <= 25 or Gender == \"Female\""), vec![true, true, false, false]);
        assert_eq!(mask("Age == 35.5"), vec![false, false, true, false]);
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(mask("Age != 25"), vec![false, true, true, true]);
        assert_eq!(mask("Age < 100"), vec![true, true, true, false]);
        assert_eq!(mask("Gender == null"), vec![false, false, false, true]);
        assert_eq!(mask("not (Gender == null)"), vec![true, true, true, false]);
        assert_eq!(mask("Gender != null"), vec![true, true, true, false]);
    }

    #[test]
    fn test_dates_and_booleans() {
        assert_eq!(mask("Joined >= '2021-01-01'"), vec![false, true, false, false]);
        assert_eq!(mask("Active"), vec![true, false, true, false]);
        assert_eq!(mask("!Active and Age > 0"), vec![false, true, false, false]);
        assert_eq!(mask("Active == true"), vec![true, false, true, false]);
    }

    #[test]
    fn test_evaluation_errors() {
        let table = people();
        let err = RowFilter::parse("Salary > 3").unwrap().evaluate(&table).unwrap_err();
        assert_eq!(err, FilterError::UnknownColumn("Salary".into()));

        let err = RowFilter::parse("Gender > 3").unwrap().evaluate(&table).unwrap_err();
        assert!(matches!(err, FilterError::TypeMismatch { .. }));

        let err = RowFilter::parse("Gender").unwrap().evaluate(&table).unwrap_err();
        assert_eq!(err, FilterError::NotBoolean("Male".into()));

        // Mismatched equality is simply false
        assert_eq!(mask("Gender == 3"), vec![false, false, false, false]);
    }

    #[test]
    fn test_apply_leaves_table_on_error() {
        let mut table = people();
        let filter = RowFilter::parse("Age > 30 or Gender > 1").unwrap();
        assert!(filter.apply(&mut table).is_err());
        assert_eq!(table.row_count(), 4);

        let filter = RowFilter::parse("Age > 30").unwrap();
        assert_eq!(filter.apply(&mut table).unwrap(), 2);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_long_chains_and_deep_nesting() {
        let table = people();
        let chain = (0..50_000)
            .map(|i| format!("Age == {}", i))
            .collect::<Vec<_>>()
            .join(" or ");
        let filter = RowFilter::parse(&chain).unwrap();
        assert_eq!(filter.evaluate(&table).unwrap(), vec![true, true, false, false]);

        let deep = format!("{}Age > 30{}", "(".repeat(100_000), ")".repeat(100_000));
        let err = RowFilter::parse(&deep).unwrap_err();
        assert!(err.to_string().contains("expression nested too deeply"));
    }
}
