//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "casekit",
    version,
    about = "Case directory tools and validation campaigns for CFD solver studies",
    long_about = "Create and refresh solver case directories, inspect their layout,\n\
                  and run verification and validation campaigns from a parameter file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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

    /// Installed package description (TOML); defaults to $CASEKIT_PACKAGE_CONFIG.
    #[arg(long = "package-config", value_name = "PATH", global = true)]
    pub package_config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create missing case subdirectories and refresh reference files and launchers.
    Update(UpdateArgs),

    /// Run a verification and validation campaign.
    Autovnv(AutovnvArgs),

    /// Show which case subdirectories are present.
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct UpdateArgs {
    /// Case to update (repeatable).
    #[arg(short = 'c', long = "case", value_name = "CASE")]
    pub cases: Vec<String>,

    /// Cases to update when no --case is given (default: current directory).
    #[arg(value_name = "CASE")]
    pub positional: Vec<String>,
}

#[derive(Parser)]
pub struct AutovnvArgs {
    /// XML parameter file.
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: PathBuf,

    /// Update case skeletons in the repository and stop.
    #[arg(short = 'u', long = "update")]
    pub update: bool,

    /// Run all cases.
    #[arg(short = 'r', long = "run")]
    pub run: bool,

    /// Compare checkpoint files between repository and destination.
    #[arg(short = 'c', long = "compare")]
    pub compare: bool,

    /// Run post-processing scripts.
    #[arg(short = 'p', long = "post")]
    pub post: bool,

    /// Space separated report recipients.
    #[arg(short = 'm', long = "mail", value_name = "ADDRESS1 ADDRESS2 ...")]
    pub mail: Option<String>,

    /// SMTP server used to send the report.
    #[arg(long = "smtp-server", default_value = "localhost")]
    pub smtp_server: String,

    #[arg(long = "smtp-port", default_value_t = 25)]
    pub smtp_port: u16,

    /// Sender address of the report mail.
    #[arg(long = "mail-from", default_value = "autovnv@localhost")]
    pub mail_from: String,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Case directory (default: derived from the working directory).
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Setup file whose location selects the case directory.
    #[arg(long = "xml", value_name = "FILE")]
    pub xml: Option<PathBuf>,
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
