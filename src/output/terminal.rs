//! Colored terminal output

use std::io::{IsTerminal, Write};

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Buffer, Color, ColorChoice, ColorSpec, WriteColor};

use crate::model::{NumericSummary, Table};
use crate::pipeline::CleaningReport;

use super::{OutputFormatter, ReportContext};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Terminal output with colors
pub struct TerminalOutput {
    color_choice: ColorChoice,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            color_choice: ColorChoice::Auto,
        }
    }

    pub fn with_color_choice(color_choice: ColorChoice) -> Self {
        Self { color_choice }
    }

    fn buffer(&self) -> Buffer {
        match self.color_choice {
            ColorChoice::Never => Buffer::no_color(),
            ColorChoice::Auto if !std::io::stdout().is_terminal() || std::env::var_os("NO_COLOR").is_some() => {
                Buffer::no_color()
            }
            _ => Buffer::ansi(),
        }
    }

    fn write_heading(&self, out: &mut Buffer, text: &str) -> Result<()> {
        out.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(out, "{}", text)?;
        out.reset()?;
        Ok(())
    }

    fn write_header(&self, out: &mut Buffer, context: &ReportContext<'_>) -> Result<()> {
        writeln!(out, "{}", RULE)?;
        match context.output {
            Some(path) => writeln!(out, " datatidy: {} → {}", context.input.display(), path.display())?,
            None => writeln!(out, " datatidy: {} (dry run)", context.input.display())?,
        }
        writeln!(out, "{}", RULE)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_overview(&self, out: &mut Buffer, report: &CleaningReport) -> Result<()> {
        writeln!(out, "Shape: {} → {}", report.before, report.after)?;
        writeln!(out)?;

        if !report.renames.is_empty() {
            self.write_heading(out, "Renamed Columns:")?;
            for rename in &report.renames {
                writeln!(out, "  {} → {}", rename.from, rename.to)?;
            }
            writeln!(out)?;
        }

        if report.overview.is_empty() {
            return Ok(());
        }

        self.write_heading(out, "Columns (as loaded):")?;
        let mut builder = Builder::default();
        builder.push_record(["column".to_string(), "type".to_string(), "missing".to_string()]);
        for col in &report.overview {
            builder.push_record([col.name.clone(), col.inferred_type.to_string(), col.missing.to_string()]);
        }
        writeln!(out, "{}", render_grid(builder))?;
        writeln!(out)?;
        Ok(())
    }

    fn write_statistics(&self, out: &mut Buffer, statistics: &[NumericSummary]) -> Result<()> {
        if statistics.is_empty() {
            return Ok(());
        }

        self.write_heading(out, "Summary Statistics:")?;
        let mut builder = Builder::default();
        builder.push_record(std::iter::once(String::new()).chain(statistics.iter().map(|s| s.column.clone())));
        builder.push_record(
            std::iter::once("count".to_string()).chain(statistics.iter().map(|s| s.count.to_string())),
        );
        let figures: Vec<_> = statistics.iter().map(NumericSummary::rows).collect();
        for (i, (label, _)) in figures[0].iter().enumerate() {
            builder.push_record(
                std::iter::once(label.to_string()).chain(figures.iter().map(|f| match f[i].1 {
                    Some(v) => format!("{:.2}", v),
                    None => "-".to_string(),
                })),
            );
        }
        writeln!(out, "{}", render_grid(builder))?;
        writeln!(out)?;
        Ok(())
    }

    fn write_preview(&self, out: &mut Buffer, table: &Table, rows: usize) -> Result<()> {
        if rows == 0 {
            return Ok(());
        }

        let shown = rows.min(table.row_count());
        self.write_heading(
            out,
            &format!("Preview ({} of {} rows):", shown, table.row_count()),
        )?;

        let mut builder = Builder::default();
        builder.push_record(table.columns.iter().map(|c| c.name.clone()));
        for row in table.rows.iter().take(shown) {
            builder.push_record(row.cells.iter().map(|c| c.display().into_owned()));
        }
        writeln!(out, "{}", render_grid(builder))?;
        writeln!(out)?;
        Ok(())
    }

    fn write_log(&self, out: &mut Buffer, report: &CleaningReport) -> Result<()> {
        self.write_heading(out, "Cleaning Log:")?;
        if report.log.is_empty() {
            writeln!(out, "  No changes logged.")?;
        }
        for entry in &report.log {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "  ✓ ")?;
            out.reset()?;
            writeln!(out, "{}", entry)?;
        }
        Ok(())
    }

    fn write_warnings(&self, out: &mut Buffer, report: &CleaningReport) -> Result<()> {
        if !report.has_warnings() {
            return Ok(());
        }

        writeln!(out)?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        writeln!(out, "Warnings:")?;
        out.reset()?;
        for warning in &report.warnings {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            write!(out, "  ! ")?;
            out.reset()?;
            writeln!(out, "{}", warning)?;
        }
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, context: &ReportContext<'_>, writer: &mut dyn Write) -> Result<()> {
        let mut out = self.buffer();

        self.write_header(&mut out, context)?;
        self.write_overview(&mut out, context.report)?;
        self.write_preview(&mut out, context.table, context.preview_rows)?;
        self.write_statistics(&mut out, context.statistics)?;
        self.write_log(&mut out, context.report)?;
        self.write_warnings(&mut out, context.report)?;

        writer.write_all(out.as_slice())?;
        Ok(())
    }
}

fn render_grid(builder: Builder) -> String {
    let mut grid = builder.build();
    grid.with(Style::modern());
    grid.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use crate::pipeline::TableShape;
    use std::path::Path;

    fn render(report: &CleaningReport, table: &Table, preview_rows: usize) -> String {
        let statistics = table.describe();
        let context = ReportContext {
            report,
            table,
            input: Path::new("people.csv"),
            output: Some(Path::new("people_cleaned.csv")),
            preview_rows,
            statistics: &statistics,
        };
        let mut out = Vec::new();
        TerminalOutput::with_color_choice(ColorChoice::Never)
            .render(&context, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_render_sections() {
        let table = Table::from_rows(
            vec!["name", "age"],
            vec![
                vec!["Alice".into(), CellValue::Int(30)],
                vec!["Bob".into(), CellValue::Null],
                vec!["Carol".into(), CellValue::Int(41)],
            ],
        );
        let report = CleaningReport {
            before: TableShape { rows: 3, columns: 2 },
            after: TableShape { rows: 3, columns: 2 },
            overview: table.overview(),
            log: vec!["Removed 0 duplicate rows based on `name`.".to_string()],
            warnings: vec!["Error in filter expression: empty expression".to_string()],
            ..Default::default()
        };

        let text = render(&report, &table, 2);

        assert!(text.contains("datatidy: people.csv → people_cleaned.csv"));
        assert!(text.contains("Shape: 3 rows x 2 columns → 3 rows x 2 columns"));
        assert!(text.contains("Preview (2 of 3 rows):"));
        assert!(text.contains("Bob"));
        assert!(text.contains("NULL"));
        assert!(!text.contains("Carol"));
        assert!(text.contains("✓ Removed 0 duplicate rows based on `name`."));
        assert!(text.contains("! Error in filter expression: empty expression"));
        assert!(!text.contains("\u{1b}["));

        assert!(text.contains("Columns (as loaded):"));
        assert!(text.contains("Summary Statistics:"));
        assert!(text.contains("35.50"));
        assert!(text.contains("7.78"));
    }

    #[test]
    fn test_no_preview_no_warnings() {
        let table = Table::from_rows(vec!["a"], vec![vec![CellValue::Int(1)]]);
        let text = render(&CleaningReport::default(), &table, 0);
        assert!(!text.contains("Preview"));
        assert!(!text.contains("Warnings"));
        assert!(text.contains("No changes logged."));
        assert!(text.contains("Summary Statistics:"));
        assert!(!text.contains("Columns (as loaded)"));
    }

    #[test]
    fn test_no_statistics_without_numeric_columns() {
        let table = Table::from_rows(vec!["name"], vec![vec!["Alice".into()]]);
        let text = render(&CleaningReport::default(), &table, 1);
        assert!(!text.contains("Summary Statistics"));
    }
}
