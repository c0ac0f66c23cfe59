//! Command implementations for the NWIS CLI
//!
//! Sets up logging, runs the selected subcommand and prints a summary of
//! the normalized table.

use crate::cli::args::{Args, Commands, FetchArgs, ParseArgs};
use crate::client::NwisClient;
use crate::config::NwisConfig;
use crate::error::{NwisError, Result};
use crate::models::{NormalizedTable, RawResponse};
use crate::processor::ResponseNormalizer;
use crate::writer::TableWriter;

use colored::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of a command, for the final report
#[derive(Debug, Clone, Default)]
pub struct CommandSummary {
    /// Rows in the normalized table
    pub rows: usize,
    /// Columns in the normalized table
    pub columns: usize,
    /// Rows written to the output file, if any
    pub rows_written: Option<usize>,
    pub output: Option<PathBuf>,
    /// Whether the service reported that nothing matched
    pub no_data: bool,
    pub elapsed: Duration,
}

/// Run the CLI command
pub async fn run(args: Args) -> Result<CommandSummary> {
    let start_time = Instant::now();
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let outcome = match &args.command {
        Commands::Fetch(fetch) => run_fetch(fetch).await,
        Commands::Parse(parse) => run_parse(parse),
    };

    let mut summary = match outcome {
        Ok(summary) => summary,
        Err(e) if e.is_empty_result() => {
            info!("Service returned no data");
            CommandSummary {
                no_data: true,
                ..Default::default()
            }
        }
        Err(e) => return Err(e),
    };
    summary.elapsed = start_time.elapsed();

    if !args.quiet {
        print_summary(&summary);
    }
    Ok(summary)
}

async fn run_fetch(args: &FetchArgs) -> Result<CommandSummary> {
    args.validate()?;

    let config = match &args.config_file {
        Some(path) => NwisConfig::from_file(path)?,
        None => NwisConfig::default(),
    };

    let client = NwisClient::new(config)?;
    let table = client.get_records(&args.to_query()).await?;

    finish(table, args.output.as_deref())
}

fn run_parse(args: &ParseArgs) -> Result<CommandSummary> {
    args.validate()?;

    let body = std::fs::read_to_string(&args.input)?;
    let response = if args.service.is_json() {
        RawResponse::Json(serde_json::from_str(&body)?)
    } else {
        RawResponse::Text(body)
    };
    info!(
        "Normalizing {} response from {}",
        args.service,
        args.input.display()
    );

    let table = ResponseNormalizer::default().normalize(args.service, response)?;
    finish(table, args.output.as_deref())
}

fn finish(table: NormalizedTable, output: Option<&Path>) -> Result<CommandSummary> {
    println!("{}", table.frame);

    let mut summary = CommandSummary {
        rows: table.height(),
        columns: table.frame.width(),
        ..Default::default()
    };

    if let Some(path) = output {
        let writer = TableWriter::new(path)?;
        summary.rows_written = Some(writer.write(&table)?);
        summary.output = Some(writer.output_path().to_path_buf());
    }

    Ok(summary)
}

fn print_summary(summary: &CommandSummary) {
    if summary.no_data {
        println!("{}", "No data returned for this query".yellow());
        return;
    }

    println!(
        "{} {} rows x {} columns in {:.2}s",
        "Normalized".green().bold(),
        summary.rows,
        summary.columns,
        summary.elapsed.as_secs_f64()
    );
    if let (Some(written), Some(output)) = (summary.rows_written, &summary.output) {
        println!(
            "{} {} rows to {}",
            "Wrote".green().bold(),
            written,
            output.display().to_string().cyan()
        );
    }
}

/// Shape of the log lines written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogStyle {
    /// Compact lines without timestamps
    Compact,
    /// Full lines with an uptime timer
    Timed,
    /// Timed lines plus the event's source file and line
    Located,
}

impl LogStyle {
    fn for_args(args: &Args) -> Self {
        match (args.quiet, args.verbose) {
            (true, _) | (false, 0) => LogStyle::Compact,
            (false, 1) => LogStyle::Timed,
            (false, _) => LogStyle::Located,
        }
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nwis_processor={}", log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match LogStyle::for_args(args) {
        LogStyle::Compact => registry
            .with(
                fmt::layer()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init(),
        LogStyle::Timed => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogStyle::Located => registry
            .with(
                fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|e| NwisError::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}
