//! ChemEquip Ingest - offline CSV validation tool

use anyhow::{Context, Result};
use chemequip_common::checksum::Checksum;
use chemequip_common::logging::{init_logging, LogConfig, LogLevel};
use chemequip_common::types::{Parameter, SummaryAccumulator};
use chemequip_ingest::{CsvParser, IngestError, ParserConfig, RowErrorPolicy};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "chemequip-ingest")]
#[command(author, version, about = "Validate equipment CSV files before upload")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a CSV file and print what an upload would produce
    Validate {
        /// Path to the CSV file
        file: PathBuf,

        /// How to treat rows that fail validation (strict or skip)
        #[arg(long, env = "CHEMEQUIP_ROW_ERROR_POLICY", default_value = "strict")]
        policy: RowErrorPolicy,

        /// Maximum number of data rows
        #[arg(long, env = "CHEMEQUIP_MAX_ROWS", default_value_t = chemequip_ingest::csv_parser::DEFAULT_MAX_ROWS)]
        max_rows: usize,

        /// Maximum file size in bytes
        #[arg(long, env = "CHEMEQUIP_MAX_UPLOAD_BYTES", default_value_t = chemequip_ingest::csv_parser::DEFAULT_MAX_UPLOAD_BYTES)]
        max_bytes: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .log_file_prefix("chemequip-ingest")
        .build()
        .with_env()?;
    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Validate {
            file,
            policy,
            max_rows,
            max_bytes,
            format,
        } => validate(file, ParserConfig {
            max_upload_bytes: max_bytes,
            max_rows,
            row_error_policy: policy,
        }, format),
    }
}

fn validate(file: PathBuf, config: ParserConfig, format: OutputFormat) -> Result<()> {
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let checksum = Checksum::of_bytes(&bytes);
    info!(file = %file.display(), checksum = %checksum.short(), "Validating");

    let outcome = match CsvParser::new(config).parse(&filename, None, &bytes) {
        Ok(outcome) => outcome,
        Err(IngestError::NoValidRows { skipped, issues }) => {
            for issue in &issues {
                warn!(%issue, "Rejected row");
            }
            anyhow::bail!("no valid rows: all {skipped} data rows were rejected");
        },
        Err(e) => return Err(e).context("File rejected"),
    };

    let mut acc = SummaryAccumulator::new();
    for row in &outcome.rows {
        acc.push(row.equipment_type, row.flowrate, row.pressure, row.temperature);
    }
    let present: Vec<(Parameter, u64)> =
        Parameter::ALL.into_iter().map(|p| (p, acc.stats(p).count)).collect();
    let summary = acc.finish();

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "file": filename,
                "checksum": checksum,
                "stats": outcome.stats,
                "issues": outcome.issues,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        },
        OutputFormat::Text => {
            println!("{filename}  sha256:{checksum}");
            println!(
                "  rows: {} accepted, {} skipped, {} blank",
                outcome.stats.accepted_rows, outcome.stats.skipped_rows, outcome.stats.blank_rows
            );
            for issue in &outcome.issues {
                println!("  skipped {issue}");
            }
            for (equipment_type, count) in &summary.equipment_type_distribution {
                println!("  {equipment_type:<16} {count}");
            }
            for (parameter, count) in present {
                match summary.average(parameter) {
                    Some(avg) => println!(
                        "  avg {:<12} {avg:.2} {} ({count} values)",
                        parameter.label(),
                        parameter.unit()
                    ),
                    None => println!("  avg {:<12} N/A", parameter.label()),
                }
            }
        },
    }

    Ok(())
}
