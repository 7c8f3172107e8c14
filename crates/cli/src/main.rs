// tabex CLI - export query results through report templates (headless)

mod exit_codes;
mod export;
mod util;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tabex_config::Settings;
use tabex_engine::filename::expand_filename_pattern;
use tabex_engine::{group_by_format, list_templates, ExportError, ExportFormat, TemplateDefinition};
use tabex_io::{inspect_schema, LoadError};

use exit_codes::{export_exit_code, load_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use export::{cmd_export, ExportArgs};
use util::pad_right;

#[derive(Parser)]
#[command(name = "tabex")]
#[command(about = "Export tabular query results as CSV, XLSX or JSON reports")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/tabex/settings.json)
    #[arg(long, global = true, env = "TABEX_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List export templates grouped by format
    #[command(after_help = "\
Examples:
  tabex templates
  tabex templates --format excel
  tabex templates --json")]
    Templates {
        /// Only show templates of this format (csv, excel, json)
        #[arg(long, short = 'f')]
        format: Option<String>,

        /// Output the catalog as JSON, option descriptors included
        #[arg(long)]
        json: bool,
    },

    /// Show the tables and columns of a dataset
    #[command(after_help = "\
Examples:
  tabex inspect sales.csv
  tabex inspect shop.db --json")]
    Inspect {
        /// Dataset file (.csv, .db, .sqlite, .sqlite3)
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a dataset through a template
    #[command(after_help = "\
CSV datasets are exported whole unless --query or --table is given; queries
see the CSV as a table named `data`. SQLite datasets need --query or --table.
Option overrides are applied on top of template defaults and settings.

Examples:
  tabex export sales.csv --template csv-excel-compatible --set delimiter=';'
  tabex export shop.db --table orders --template finance-quarterly-report
  tabex export shop.db --query 'SELECT * FROM orders' -t json-basic -o -
  tabex export sales.csv -t excel-formatted-report --filename q3 --out-dir reports/
  tabex export sales.csv -q 'SELECT region, SUM(units) FROM data GROUP BY region' -t csv-basic")]
    Export {
        /// Dataset file (.csv, .db, .sqlite, .sqlite3)
        file: PathBuf,

        /// Template id (default: export.defaultTemplate from settings)
        #[arg(long, short = 't')]
        template: Option<String>,

        /// SQL query to run (a CSV dataset is table `data`)
        #[arg(long, short = 'q', conflicts_with = "table")]
        query: Option<String>,

        /// Export a whole table
        #[arg(long)]
        table: Option<String>,

        /// Override a template option (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Custom filename without extension
        #[arg(long)]
        filename: Option<String>,

        /// Output path, directory, or - for stdout
        #[arg(long, short = 'o', conflicts_with = "out_dir")]
        output: Option<PathBuf>,

        /// Directory for the generated filename
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Suppress the summary line
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: tabex <command> [options]");
            eprintln!("       tabex --help for more information");
            Ok(())
        }
        Some(Commands::Templates { format, json }) => cmd_templates(format, json),
        Some(Commands::Inspect { file, json }) => cmd_inspect(file, json),
        Some(Commands::Export {
            file,
            template,
            query,
            table,
            set,
            filename,
            output,
            out_dir,
            quiet,
        }) => cmd_export(
            ExportArgs { file, template, query, table, set, filename, output, out_dir, quiet },
            &settings,
        ),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<LoadError> for CliError {
    fn from(err: LoadError) -> Self {
        Self { code: load_exit_code(&err), message: err.to_string(), hint: None }
    }
}

impl From<ExportError> for CliError {
    fn from(err: ExportError) -> Self {
        Self { code: export_exit_code(&err), message: err.to_string(), hint: None }
    }
}

fn write_out(text: &str) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// templates
// ============================================================================

fn cmd_templates(format: Option<String>, json: bool) -> Result<(), CliError> {
    let wanted: Option<ExportFormat> = format
        .as_deref()
        .map(str::parse::<ExportFormat>)
        .transpose()
        .map_err(|e: ExportError| CliError::from(e).with_hint("formats: csv, excel, json"))?;

    let templates: Vec<&TemplateDefinition> = list_templates()
        .iter()
        .filter(|t| wanted.map_or(true, |f| t.format == f))
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&templates)
            .map_err(|e| CliError::io(format!("cannot serialize catalog: {e}")))?;
        return write_out(&format!("{out}\n"));
    }

    let today = Utc::now().date_naive();
    let id_width = templates.iter().map(|t| t.id.len()).max().unwrap_or(0);
    let file_width = templates
        .iter()
        .map(|t| expand_filename_pattern(t, today).len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    let owned: Vec<TemplateDefinition> = templates.iter().map(|t| **t).collect();
    for (format, group) in group_by_format(&owned) {
        out.push_str(&format!("{format}\n"));
        for t in group {
            out.push_str(&format!(
                "  {}  {}  {}  {}\n",
                pad_right(t.id, id_width),
                pad_right(t.name, 28),
                pad_right(&expand_filename_pattern(t, today), file_width),
                t.description
            ));
        }
    }
    write_out(&out)
}

// ============================================================================
// inspect
// ============================================================================

fn cmd_inspect(file: PathBuf, json: bool) -> Result<(), CliError> {
    let schema = inspect_schema(&file)?;

    if json {
        let out = serde_json::to_string_pretty(&schema)
            .map_err(|e| CliError::io(format!("cannot serialize schema: {e}")))?;
        return write_out(&format!("{out}\n"));
    }

    let mut out = String::new();
    for table in &schema {
        out.push_str(&format!("{} ({} columns)\n", table.name, table.columns.len()));
        for column in &table.columns {
            out.push_str(&format!("  {column}\n"));
        }
    }
    if schema.is_empty() {
        out.push_str("(no tables)\n");
    }
    write_out(&out)
}
