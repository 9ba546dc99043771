//! Command line definitions for `odfedit`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "odfedit",
    version,
    about = "Check, convert and inspect GrandOrgue organ definition files",
    long_about = "Check, convert and inspect GrandOrgue organ definition files.\n\n\
                  Validates .organ files against the bundled object schemas, verifies\n\
                  that unedited files are written back byte for byte, and converts\n\
                  Hauptwerk sample-set descriptors."
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

    /// Log output format (pretty for humans, json for machines).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Include timestamps in log lines.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,

    /// Include the emitting module in log lines.
    #[arg(long = "log-targets", global = true)]
    pub log_targets: bool,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load and validate an organ definition.
    Check(CheckArgs),

    /// Verify that an unedited file is written back unchanged.
    Roundtrip(RoundtripArgs),

    /// Convert a Hauptwerk sample-set descriptor.
    Convert(ConvertArgs),

    /// List object types, or the attributes of one type.
    Types(TypesArgs),

    /// List the objects of one type with their attributes and referrers.
    Show(ShowArgs),
}

#[derive(Parser)]
pub struct CheckArgs {
    #[arg(value_name = "ODF")]
    pub path: PathBuf,

    /// Directory sample and image paths are relative to; enables file checks.
    #[arg(long = "samples", value_name = "DIR")]
    pub samples: Option<PathBuf>,

    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: ReportFormatArg,
}

#[derive(Parser)]
pub struct RoundtripArgs {
    #[arg(value_name = "ODF")]
    pub path: PathBuf,
}

#[derive(Parser)]
pub struct ConvertArgs {
    #[arg(value_name = "XML")]
    pub input: PathBuf,

    /// Organ definition file to write.
    #[arg(short = 'o', long = "output", value_name = "ODF")]
    pub output: PathBuf,

    /// Church name for the converted organ.
    #[arg(long = "organ-name", value_name = "NAME")]
    pub organ_name: Option<String>,
}

#[derive(Parser)]
pub struct TypesArgs {
    /// Show the attributes of this type.
    #[arg(long = "type", value_name = "NAME")]
    pub type_name: Option<String>,
}

#[derive(Parser)]
pub struct ShowArgs {
    #[arg(value_name = "ODF")]
    pub path: PathBuf,

    #[arg(long = "type", value_name = "NAME")]
    pub type_name: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormatArg {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
