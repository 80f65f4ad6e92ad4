//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use dqf_cli::logging::LogFormat;
use dqf_cli::workflow::parse_override;

#[derive(Parser)]
#[command(
    name = "dqf",
    version,
    about = "Map messy CSV headers to a canonical schema and repair their values",
    long_about = "Map messy CSV headers to a canonical schema and repair their values.\n\n\
                  Headers are resolved through canonical names, header patterns, learned\n\
                  synonyms and fuzzy matching; cells are validated per column and fixes\n\
                  are suggested. Accepted knowledge is promoted into the schema file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Schema truth document.
    #[arg(
        long = "schema",
        value_name = "PATH",
        env = "DQF_SCHEMA_PATH",
        default_value = "docs/schema_truth_source.json",
        global = true
    )]
    pub schema: PathBuf,

    /// Never call the language-model oracle, even when credentials are set.
    #[arg(long = "no-oracle", global = true)]
    pub no_oracle: bool,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the canonical columns of the schema.
    Schema,

    /// Show how the headers of a CSV file resolve.
    Map(MapArgs),

    /// Validate a CSV file, report issues and optionally write a cleaned copy.
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// Raw CSV file.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Field delimiter (sniffed among , ; tab | when omitted).
    #[arg(long = "delimiter", value_name = "CHAR", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Map a source header to a canonical key (repeatable).
    #[arg(long = "override", value_name = "SOURCE=KEY", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,

    /// Leave a source header unmapped (repeatable).
    #[arg(long = "ignore", value_name = "SOURCE")]
    pub ignore: Vec<String>,

    /// Apply every suggested fix before writing the output.
    #[arg(long = "apply-fixes")]
    pub apply_fixes: bool,

    /// Cleaned dataset destination.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write the issue ledger as JSON.
    #[arg(long = "issues", value_name = "PATH")]
    pub issues: Option<PathBuf>,

    /// Promote overrides and learned fixes into the schema file.
    #[arg(long = "promote")]
    pub promote: bool,

    /// Add the oracle's proposed columns for unmapped headers (with --promote).
    #[arg(long = "accept-proposals", requires = "promote")]
    pub accept_proposals: bool,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("expected a single ASCII character, got '{value}'")),
        },
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
