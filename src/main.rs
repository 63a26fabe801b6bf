//! datatidy - Column normalization and per-column cleaning for tabular data

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use datatidy::config::{CleanConfig, OutputFormat};
use datatidy::normalize::CaseStyle;
use datatidy::output::{render_to_stdout, ReportContext};
use datatidy::parser::{input_format, ParserFactory};
use datatidy::pipeline::Pipeline;
use datatidy::writer::{default_output_path, WriterFactory};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCaseStyle {
    Snake,
    Camel,
    Unchanged,
}

impl From<CliCaseStyle> for CaseStyle {
    fn from(c: CliCaseStyle) -> Self {
        match c {
            CliCaseStyle::Snake => CaseStyle::Snake,
            CliCaseStyle::Camel => CaseStyle::Camel,
            CliCaseStyle::Unchanged => CaseStyle::Unchanged,
        }
    }
}

/// Clean tabular data (CSV, Excel): normalize headers, transform columns, filter rows
#[derive(Parser, Debug)]
#[command(name = "datatidy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to clean
    input: PathBuf,

    /// Where to write the cleaned file (default: <input>_cleaned.<csv|xlsx>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Column name convention
    #[arg(long, value_enum)]
    case: Option<CliCaseStyle>,

    /// Per-column operation as COLUMN=OPERATION, e.g. "age=fill-mean" (repeatable, applied in order)
    #[arg(long = "op", value_name = "COLUMN=OPERATION", value_parser = parse_assignment)]
    operations: Vec<(String, String)>,

    /// Pattern for a regex-cleaned column as COLUMN=PATTERN (repeatable)
    #[arg(long = "regex", value_name = "COLUMN=PATTERN", value_parser = parse_assignment)]
    regex_patterns: Vec<(String, String)>,

    /// JSON request file; command-line options are applied on top of it
    #[arg(long, value_name = "FILE")]
    spec: Option<PathBuf>,

    /// Drop rows containing any missing value
    #[arg(long)]
    drop_missing: bool,

    /// Keep only rows matching an expression, e.g. "age > 30 and gender == 'Male'"
    #[arg(long, value_name = "EXPR")]
    filter: Option<String>,

    /// Append an `anomaly` column (-1 anomaly, 1 normal) computed over numeric columns
    #[arg(long)]
    flag_anomalies: bool,

    /// For Excel files: which sheet to read
    #[arg(long)]
    sheet: Option<String>,

    /// Number of rows to preview in the report
    #[arg(long, value_name = "N")]
    preview: Option<usize>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliOutputFormat,

    /// Clean and report without writing the output file
    #[arg(long)]
    dry_run: bool,
}

/// Split `COLUMN=VALUE` at the first `=`; the value may contain more
fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((column, value)) if !column.is_empty() && !value.is_empty() => {
            Ok((column.to_string(), value.to_string()))
        }
        _ => Err(format!("expected COLUMN=VALUE, got '{}'", s)),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn build_config(cli: Cli) -> Result<CleanConfig> {
    let mut config = match cli.spec {
        Some(ref path) => CleanConfig::from_json_file(path)?,
        None => CleanConfig::default(),
    };
    config.input = cli.input;
    config.output = cli.output;
    config.output_format = cli.format.into();
    config.dry_run = cli.dry_run;

    if let Some(case) = cli.case {
        config = config.with_case_style(case.into());
    }
    for (column, operation) in cli.operations {
        config = config.with_operation(column, operation);
    }
    for (column, pattern) in cli.regex_patterns {
        config = config.with_regex_pattern(column, pattern);
    }
    if cli.drop_missing {
        config = config.with_drop_missing(true);
    }
    if let Some(filter) = cli.filter {
        config = config.with_filter(filter);
    }
    if cli.flag_anomalies {
        config = config.with_flag_anomalies(true);
    }
    if let Some(sheet) = cli.sheet {
        config = config.with_sheet_name(sheet);
    }
    if let Some(rows) = cli.preview {
        config = config.with_preview_rows(rows);
    }

    Ok(config)
}

fn run() -> Result<()> {
    let config = build_config(Cli::parse())?;
    let input = config.input.clone();

    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let mut table = ParserFactory::new()
        .parse(&input, &config)
        .with_context(|| format!("Failed to parse file: {}", input.display()))?;
    info!(rows = table.row_count(), columns = table.column_count(), "loaded {}", input.display());

    let pipeline = Pipeline::new(config);
    let report = pipeline.clean(&mut table)?;
    let config = pipeline.config();

    let output = if config.dry_run {
        None
    } else {
        let path = config
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&input, &input_format(&input)));
        WriterFactory::new()
            .write(&table, &path)
            .with_context(|| format!("Failed to write cleaned file: {}", path.display()))?;
        info!(path = %path.display(), "wrote cleaned table");
        Some(path)
    };

    let statistics = table.describe();
    let context = ReportContext {
        report: &report,
        table: &table,
        input: &input,
        output: output.as_deref(),
        preview_rows: config.preview_rows,
        statistics: &statistics,
    };

    render_to_stdout(&context, config.output_format)
}
