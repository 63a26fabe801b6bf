//! Output formatting for cleaning reports

mod json;
mod terminal;

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::config::OutputFormat;
use crate::model::{NumericSummary, Table};
use crate::pipeline::CleaningReport;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;

/// Everything a formatter needs to describe one cleaning request
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub report: &'a CleaningReport,
    /// The cleaned table
    pub table: &'a Table,
    pub input: &'a Path,
    /// Where the table was written; `None` on a dry run
    pub output: Option<&'a Path>,
    /// Number of leading rows to show
    pub preview_rows: usize,
    /// `describe` figures for the cleaned table's numeric columns
    pub statistics: &'a [NumericSummary],
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render the report to a writer
    fn render(&self, context: &ReportContext<'_>, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: OutputFormat) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render the report to stdout
pub fn render_to_stdout(context: &ReportContext<'_>, format: OutputFormat) -> Result<()> {
    let formatter = OutputFactory::create(format);
    let mut stdout = std::io::stdout().lock();
    formatter.render(context, &mut stdout)
}
