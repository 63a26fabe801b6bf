//! Per-column cleaning operations and the engine that applies them.

mod dates;
mod engine;
mod operations;

pub use dates::{parse_date_cell, parse_date_str};
pub use engine::{title_case, TransformationEngine};
pub use operations::{Operation, OperationKind, TransformationSpec, DEFAULT_REGEX_PATTERN};
