//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Args, Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Rebound - resilient HTTP requests from the command line
///
/// Sends requests through the Rebound orchestrator: 503 responses are retried
/// with exponential backoff, unreachable hosts are retried on an interval, and
/// uploads report progress.
#[derive(Parser, Debug)]
#[command(
    name = "rebound",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "REBOUND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a URL with GET
    Get(GetArgs),

    /// Send a request with a body (POST by default)
    Send(SendArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Retry and request options shared by `get` and `send`
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Total attempts for retryable failures (overrides config)
    #[arg(long, value_name = "N")]
    pub attempts: Option<u32>,

    /// Wait before the first retry in milliseconds; doubles per retry (overrides config)
    #[arg(long, value_name = "MS")]
    pub base_delay_ms: Option<u64>,

    /// Re-run an unreachable request only once instead of until it gets a response
    #[arg(long)]
    pub no_offline_retry: bool,

    /// Force every failure to be retried (true) or never retried (false)
    #[arg(long, value_name = "BOOL")]
    pub retryable: Option<bool>,

    /// Cancel the whole call after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Extra request header, e.g. -H "Accept: application/json"
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Print response headers
    #[arg(short, long)]
    pub include: bool,

    /// Write the response body to a file instead of stdout
    #[arg(long = "save-to", value_name = "FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Target URL
    pub url: String,

    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the send command
#[derive(Parser, Debug)]
pub struct SendArgs {
    /// Target URL
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "POST")]
    pub method: String,

    /// Send this text as the body
    #[arg(short, long, group = "body")]
    pub data: Option<String>,

    /// Send this JSON document as the body
    #[arg(long, group = "body")]
    pub json: Option<String>,

    /// Upload a file as a multipart form field
    #[arg(long, value_name = "PATH", group = "body")]
    pub file: Option<PathBuf>,

    /// Upload a file as the raw request body
    #[arg(long, value_name = "PATH", group = "body")]
    pub binary: Option<PathBuf>,

    /// Form field name used for --file
    #[arg(long, default_value = "file", requires = "file")]
    pub file_field: String,

    /// Extra multipart text field, e.g. --field title=report
    #[arg(short = 'F', long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Track this call as a read even though it carries a body
    #[arg(long)]
    pub read: bool,

    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Validate the effective configuration
    Validate,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to the user config path)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Force overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
