//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::EventKind;

/// Telemetry CLI - validate logger configurations and emit events through them
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-cli",
    author,
    version,
    about = "Level-filtered log and telemetry dispatcher",
    long_about = "Loads a logger configuration, builds its sinks and fans events out \n\
                  to every sink whose level mask enables them."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "TELEMETRY_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    Validate(ValidateArgs),

    /// Display configured sinks and their effective levels
    Info(InfoArgs),

    /// Build the logger and emit a single event through it
    Emit(EmitArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "logger.toml", env = "TELEMETRY_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "logger.toml", env = "TELEMETRY_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `emit` command
#[derive(Parser, Debug, Clone)]
pub struct EmitArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "logger.toml", env = "TELEMETRY_CONFIG")]
    pub config: PathBuf,

    /// Kind of event to emit
    #[arg(value_enum)]
    pub kind: EmitKind,

    /// Message, or the event/metric name
    pub message: String,

    /// Metric value
    #[arg(long, default_value_t = 0.0)]
    pub value: f64,

    /// Metric sample count
    #[arg(long)]
    pub count: Option<u64>,

    /// Metric minimum
    #[arg(long)]
    pub min: Option<f64>,

    /// Metric maximum
    #[arg(long)]
    pub max: Option<f64>,

    /// Event duration in milliseconds
    #[arg(long, default_value_t = 0.0)]
    pub duration: f64,

    /// Extra properties as key=value (repeatable; values parsed as JSON when possible)
    #[arg(long = "data", value_parser = parse_key_value)]
    pub data: Vec<(String, String)>,

    /// Append telemetry envelopes to this file instead of stdout
    #[arg(long, env = "TELEMETRY_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Capacity of the telemetry export queue
    #[arg(long, default_value = "256", env = "TELEMETRY_QUEUE_CAPACITY")]
    pub queue_capacity: usize,
}

/// Event kinds accepted by `emit`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitKind {
    Error,
    Warn,
    Info,
    Verbose,
    Debug,
    Event,
    Metric,
    Exception,
}

impl From<EmitKind> for EventKind {
    fn from(kind: EmitKind) -> Self {
        match kind {
            EmitKind::Error => EventKind::Error,
            EmitKind::Warn => EventKind::Warn,
            EmitKind::Info => EventKind::Info,
            EmitKind::Verbose => EventKind::Verbose,
            EmitKind::Debug => EventKind::Debug,
            EmitKind::Event => EventKind::Event,
            EmitKind::Metric => EventKind::Metric,
            EmitKind::Exception => EventKind::Exception,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
