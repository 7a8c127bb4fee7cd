use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use ledgerlift_core::ParseOutcome;
use ledgerlift_export::{dated_output_dir, prune_dated_dirs, write_csv, write_xlsx};
use ledgerlift_ingest::{PageSource, PdfExtractor, join_pages};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(
    name = "ledgerlift",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("LEDGERLIFT_BUILD_SHA"), ")"),
    about = "Rebuild transaction tables from bank statement PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a statement PDF into a spreadsheet
    Convert {
        /// Statement PDF to read
        input: PathBuf,

        /// Password for protected documents
        #[arg(long)]
        password: Option<String>,

        /// Base directory for dated output folders
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Xlsx)]
        format: OutputFormat,

        /// Polarity policy TOML (defaults to the built-in vocabulary)
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Delete dated output folders older than this many days (0 keeps everything)
        #[arg(long, default_value_t = 30)]
        keep_days: u32,
    },

    /// Parse a statement and print a summary without writing files
    Inspect {
        /// Statement PDF to read
        input: PathBuf,

        /// Password for protected documents
        #[arg(long)]
        password: Option<String>,

        /// Polarity policy TOML (defaults to the built-in vocabulary)
        #[arg(long)]
        policy: Option<PathBuf>,
    },

    /// Write the built-in polarity policy to a TOML file for editing
    PolicyInit {
        /// Destination path
        #[arg(long, default_value = "policy.toml")]
        path: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Xlsx,
    Csv,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Convert {
            input,
            password,
            out_dir,
            format,
            policy,
            keep_days,
        } => convert(&input, password.as_deref(), &out_dir, format, policy.as_deref(), keep_days),
        Command::Inspect {
            input,
            password,
            policy,
        } => inspect(&input, password.as_deref(), policy.as_deref()),
        Command::PolicyInit { path } => config::write_default_policy(&path),
    }
}

fn parse_input(input: &Path, password: Option<&str>, policy: Option<&Path>) -> Result<ParseOutcome> {
    if !input.exists() {
        bail!("input not found: {}", input.display());
    }
    let policy = config::load_policy(policy)?;
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let pages = PdfExtractor
        .extract_pages(&bytes, password)
        .with_context(|| format!("extracting text from {}", input.display()))?;
    let text = join_pages(&pages);
    Ok(ledgerlift_core::parse_document(&text, &policy.polarity))
}

fn convert(
    input: &Path,
    password: Option<&str>,
    out_dir: &Path,
    format: OutputFormat,
    policy: Option<&Path>,
    keep_days: u32,
) -> Result<()> {
    let outcome = parse_input(input, password, policy)?;

    let today = Local::now().date_naive();
    if keep_days > 0 {
        for dir in prune_dated_dirs(out_dir, keep_days, today)? {
            println!("Pruned {}", dir.display());
        }
    }
    let dir = dated_output_dir(out_dir, today)?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("statement");
    let path = match format {
        OutputFormat::Xlsx => {
            let p = dir.join(format!("{stem}.xlsx"));
            write_xlsx(&outcome.table, &p)?;
            p
        }
        OutputFormat::Csv => {
            let p = dir.join(format!("{stem}.csv"));
            write_csv(&outcome.table, &p)?;
            p
        }
    };

    print_summary(&outcome);
    println!("Wrote {}", path.display());
    Ok(())
}

fn inspect(input: &Path, password: Option<&str>, policy: Option<&Path>) -> Result<()> {
    let outcome = parse_input(input, password, policy)?;
    print_summary(&outcome);

    println!("\n{}", outcome.table.headers.join(" | "));
    for row in outcome.table.rows.iter().take(10) {
        println!("{}", row.join(" | "));
    }
    if outcome.table.rows.len() > 10 {
        println!("... {} more rows", outcome.table.rows.len() - 10);
    }
    Ok(())
}

fn print_summary(outcome: &ParseOutcome) {
    println!(
        "Parsed {} lines into {} rows",
        outcome.lines_scanned, outcome.records_emitted
    );
    if !outcome.is_bank_statement {
        println!("Input did not read as a bank statement; wrote the generic table instead");
    }
    if outcome.rows_without_amounts > 0 {
        println!("{} rows carried no amounts", outcome.rows_without_amounts);
    }
    for w in &outcome.warnings {
        println!("warning: {w}");
    }
}
