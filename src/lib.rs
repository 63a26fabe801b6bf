//! datatidy - Column normalization and per-column cleaning for tabular data
//!
//! Loads a CSV or Excel table, rewrites its column names to a chosen
//! convention, applies per-column cleaning operations in a caller-visible
//! order, then optionally drops incomplete rows, filters rows with a small
//! expression language and flags anomalous rows.

pub mod anomaly;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod transform;
pub mod writer;

pub use config::CleanConfig;
pub use error::{CleanError, Result};
pub use model::Table;
pub use normalize::{normalize_columns, CaseStyle};
pub use pipeline::{clean_table, CleaningReport, Pipeline};
pub use transform::{Operation, OperationKind, TransformationEngine, TransformationSpec};
