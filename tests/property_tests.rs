//! Property-based tests for column normalization and cleaning operations.

use proptest::prelude::*;

use datatidy::model::{CellValue, Table};
use datatidy::transform::{Operation, TransformationEngine, TransformationSpec};
use datatidy::{normalize_columns, CaseStyle};

// =============================================================================
// Test Strategies
// =============================================================================

/// Header-like strings: words, mixed case, stray whitespace
fn header() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ \t]{0,2}[A-Za-z]{1,8}( {1,3}[A-Za-z0-9]{1,8}){0,3}[ \t]{0,2}",
        "[a-z]{1,6}[A-Z][a-z]{0,6}",
        "[A-Z]{1,4}[a-z]{0,4}_[a-z]{1,4}",
        "[A-Za-zÀ-ÿ ]{1,12}[a-z]",
    ]
}

fn headers() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(header(), 1..8)
}

fn table_with(headers: &[String]) -> Table {
    let row = headers.iter().map(|_| CellValue::Int(1)).collect();
    Table::from_rows(headers.to_vec(), vec![row])
}

fn names(table: &Table) -> Vec<String> {
    table.column_names().into_iter().map(str::to_string).collect()
}

fn small_ints() -> impl Strategy<Value = Vec<Option<i64>>> {
    prop::collection::vec(prop::option::of(0i64..5), 0..30)
}

fn int_table(values: &[Option<i64>]) -> Table {
    Table::from_rows(
        vec!["k", "n"],
        values
            .iter()
            .enumerate()
            .map(|(i, v)| vec![CellValue::from(*v), CellValue::Int(i as i64)])
            .collect(),
    )
}

// =============================================================================
// Normalization
// =============================================================================

proptest! {
    #[test]
    fn normalization_is_idempotent(headers in headers(), camel in any::<bool>()) {
        let style = if camel { CaseStyle::Camel } else { CaseStyle::Snake };
        let mut table = table_with(&headers);

        normalize_columns(&mut table, style).unwrap();
        let once = names(&table);
        let renames = normalize_columns(&mut table, style).unwrap();

        prop_assert_eq!(names(&table), once);
        prop_assert!(renames.is_empty());
    }

    #[test]
    fn normalized_names_are_unique(headers in headers(), camel in any::<bool>()) {
        let style = if camel { CaseStyle::Camel } else { CaseStyle::Snake };
        let mut table = table_with(&headers);

        normalize_columns(&mut table, style).unwrap();
        let mut sorted = names(&table);
        sorted.sort();
        sorted.dedup();

        prop_assert_eq!(sorted.len(), headers.len());
        prop_assert!(names(&table).iter().all(|n| !n.is_empty() && !n.contains(char::is_whitespace)));
    }

    #[test]
    fn normalization_never_touches_rows(headers in headers()) {
        let mut table = table_with(&headers);
        let before = table.rows.clone();

        normalize_columns(&mut table, CaseStyle::Snake).unwrap();

        prop_assert_eq!(table.rows, before);
    }
}

// =============================================================================
// Operations
// =============================================================================

proptest! {
    #[test]
    fn remove_duplicates_keeps_first_occurrences(values in small_ints()) {
        let mut table = int_table(&values);
        let spec = TransformationSpec::new().with("k", Operation::RemoveDuplicates);
        TransformationEngine::new().apply(&mut table, &spec).unwrap();

        prop_assert!(table.row_count() <= values.len());

        let mut expected = Vec::new();
        for (i, v) in values.iter().enumerate() {
            if !values[..i].contains(v) {
                expected.push(i as i64);
            }
        }
        let kept: Vec<i64> = table
            .column_values(1)
            .filter_map(|c| match c {
                CellValue::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn fill_mean_without_missing_is_noop(values in prop::collection::vec(-1000i64..1000, 1..30)) {
        let present: Vec<Option<i64>> = values.iter().copied().map(Some).collect();
        let mut table = int_table(&present);
        let before = table.rows.clone();

        let spec = TransformationSpec::new().with("k", Operation::FillMissingMean);
        let log = TransformationEngine::new().apply(&mut table, &spec).unwrap();

        prop_assert_eq!(table.rows, before);
        prop_assert_eq!(log.len(), 1);
        prop_assert!(log[0].starts_with("Filled 0 missing values in `k`"));
    }

    #[test]
    fn drop_column_preserves_the_rest(values in small_ints()) {
        let mut table = int_table(&values);
        let kept: Vec<CellValue> = table.column_values(1).cloned().collect();

        let spec = TransformationSpec::new().with("k", Operation::DropColumn);
        TransformationEngine::new().apply(&mut table, &spec).unwrap();

        prop_assert_eq!(table.column_names(), vec!["n"]);
        prop_assert_eq!(table.column_values(0).cloned().collect::<Vec<_>>(), kept);
    }
}
