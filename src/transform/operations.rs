//! Column operations and the per-request transformation spec.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CleanError, Result};

/// Pattern used by regex cleaning when the request does not supply one.
pub const DEFAULT_REGEX_PATTERN: &str = r"[^a-zA-Z0-9\s]";

/// Operation tag as chosen by the user, before any pattern is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    #[serde(rename = "Title Case", alias = "title-case")]
    TitleCase,
    #[serde(rename = "Upper Case", alias = "upper-case")]
    UpperCase,
    #[serde(rename = "Lower Case", alias = "lower-case")]
    LowerCase,
    #[serde(rename = "Date Format", alias = "date-format")]
    DateFormat,
    #[serde(rename = "Remove Spaces", alias = "remove-spaces")]
    RemoveSpaces,
    #[serde(rename = "Remove Duplicates", alias = "remove-duplicates")]
    RemoveDuplicates,
    #[serde(rename = "Fill Missing (Mean)", alias = "fill-mean")]
    FillMissingMean,
    #[serde(rename = "Fill Missing (Median)", alias = "fill-median")]
    FillMissingMedian,
    #[serde(rename = "Remove Special Characters", alias = "remove-special-characters")]
    RemoveSpecialCharacters,
    #[serde(rename = "Drop Column", alias = "drop-column")]
    DropColumn,
    #[serde(rename = "Regex Clean", alias = "regex-clean")]
    RegexClean,
}

impl OperationKind {
    pub const ALL: [OperationKind; 11] = [
        OperationKind::TitleCase,
        OperationKind::UpperCase,
        OperationKind::LowerCase,
        OperationKind::DateFormat,
        OperationKind::RemoveSpaces,
        OperationKind::RemoveDuplicates,
        OperationKind::FillMissingMean,
        OperationKind::FillMissingMedian,
        OperationKind::RemoveSpecialCharacters,
        OperationKind::DropColumn,
        OperationKind::RegexClean,
    ];

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            OperationKind::TitleCase => "Title Case",
            OperationKind::UpperCase => "Upper Case",
            OperationKind::LowerCase => "Lower Case",
            OperationKind::DateFormat => "Date Format",
            OperationKind::RemoveSpaces => "Remove Spaces",
            OperationKind::RemoveDuplicates => "Remove Duplicates",
            OperationKind::FillMissingMean => "Fill Missing (Mean)",
            OperationKind::FillMissingMedian => "Fill Missing (Median)",
            OperationKind::RemoveSpecialCharacters => "Remove Special Characters",
            OperationKind::DropColumn => "Drop Column",
            OperationKind::RegexClean => "Regex Clean",
        }
    }

    /// Command-line spelling
    pub fn slug(self) -> &'static str {
        match self {
            OperationKind::TitleCase => "title-case",
            OperationKind::UpperCase => "upper-case",
            OperationKind::LowerCase => "lower-case",
            OperationKind::DateFormat => "date-format",
            OperationKind::RemoveSpaces => "remove-spaces",
            OperationKind::RemoveDuplicates => "remove-duplicates",
            OperationKind::FillMissingMean => "fill-mean",
            OperationKind::FillMissingMedian => "fill-median",
            OperationKind::RemoveSpecialCharacters => "remove-special-characters",
            OperationKind::DropColumn => "drop-column",
            OperationKind::RegexClean => "regex-clean",
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = CleanError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        OperationKind::ALL
            .into_iter()
            .find(|kind| {
                kind.label().eq_ignore_ascii_case(wanted) || kind.slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| CleanError::UnknownOperation(s.to_string()))
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A ready-to-apply column operation
#[derive(Debug, Clone)]
pub enum Operation {
    TitleCase,
    UpperCase,
    LowerCase,
    DateFormat,
    RemoveSpaces,
    RemoveDuplicates,
    FillMissingMean,
    FillMissingMedian,
    RemoveSpecialCharacters,
    DropColumn,
    RegexClean { pattern: Regex },
}

impl Operation {
    /// Build an operation for `column`, compiling the regex pattern if needed.
    ///
    /// `pattern` is ignored by every kind except [`OperationKind::RegexClean`],
    /// which falls back to [`DEFAULT_REGEX_PATTERN`].
    pub fn new(kind: OperationKind, column: &str, pattern: Option<&str>) -> Result<Self> {
        Ok(match kind {
            OperationKind::TitleCase => Operation::TitleCase,
            OperationKind::UpperCase => Operation::UpperCase,
            OperationKind::LowerCase => Operation::LowerCase,
            OperationKind::DateFormat => Operation::DateFormat,
            OperationKind::RemoveSpaces => Operation::RemoveSpaces,
            OperationKind::RemoveDuplicates => Operation::RemoveDuplicates,
            OperationKind::FillMissingMean => Operation::FillMissingMean,
            OperationKind::FillMissingMedian => Operation::FillMissingMedian,
            OperationKind::RemoveSpecialCharacters => Operation::RemoveSpecialCharacters,
            OperationKind::DropColumn => Operation::DropColumn,
            OperationKind::RegexClean => {
                let source = pattern.unwrap_or(DEFAULT_REGEX_PATTERN);
                let pattern = Regex::new(source).map_err(|source| CleanError::InvalidPattern {
                    column: column.to_string(),
                    source,
                })?;
                Operation::RegexClean { pattern }
            }
        })
    }

    /// Tag this operation was built from
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::TitleCase => OperationKind::TitleCase,
            Operation::UpperCase => OperationKind::UpperCase,
            Operation::LowerCase => OperationKind::LowerCase,
            Operation::DateFormat => OperationKind::DateFormat,
            Operation::RemoveSpaces => OperationKind::RemoveSpaces,
            Operation::RemoveDuplicates => OperationKind::RemoveDuplicates,
            Operation::FillMissingMean => OperationKind::FillMissingMean,
            Operation::FillMissingMedian => OperationKind::FillMissingMedian,
            Operation::RemoveSpecialCharacters => OperationKind::RemoveSpecialCharacters,
            Operation::DropColumn => OperationKind::DropColumn,
            Operation::RegexClean { .. } => OperationKind::RegexClean,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::RegexClean { pattern } => write!(f, "Regex Clean ({})", pattern.as_str()),
            other => f.write_str(other.kind().label()),
        }
    }
}

/// Column name to operation, applied in insertion order
#[derive(Debug, Clone, Default)]
pub struct TransformationSpec {
    operations: IndexMap<String, Operation>,
}

impl TransformationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operation for a column; a repeated column keeps its original position
    pub fn insert(&mut self, column: impl Into<String>, operation: Operation) -> Option<Operation> {
        self.operations.insert(column.into(), operation)
    }

    /// Builder form of [`TransformationSpec::insert`]
    pub fn with(mut self, column: impl Into<String>, operation: Operation) -> Self {
        self.insert(column, operation);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operation)> {
        self.operations.iter().map(|(c, op)| (c.as_str(), op))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
