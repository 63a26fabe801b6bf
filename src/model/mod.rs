//! Data model for tabular data representation

mod schema;
pub mod stats;
mod table;

pub use schema::{CellType, Column};
pub use stats::{ColumnSummary, NumericSummary};
pub use table::{CellValue, Row, Table};
