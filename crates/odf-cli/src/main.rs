//! `odfedit` command line tool.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use odf_cli::commands::{run_check, run_convert, run_roundtrip, run_show, run_types};
use odf_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, ReportFormatArg};
use crate::summary::{
    print_check, print_check_json, print_convert, print_objects, print_roundtrip, print_types,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(command: &Command) -> Result<i32> {
    match command {
        Command::Check(args) => {
            let result = run_check(&args.path, args.samples.as_deref())?;
            match args.format {
                ReportFormatArg::Table => print_check(&result),
                ReportFormatArg::Json => print_check_json(&result)?,
            }
            Ok(i32::from(result.has_errors()))
        }
        Command::Roundtrip(args) => {
            let result = run_roundtrip(&args.path)?;
            print_roundtrip(&result);
            Ok(i32::from(!result.is_identical()))
        }
        Command::Convert(args) => {
            let result = run_convert(&args.input, &args.output, args.organ_name.as_deref())?;
            print_convert(&result);
            Ok(i32::from(result.report.has_errors()))
        }
        Command::Types(args) => {
            print_types(&run_types(args.type_name.as_deref())?);
            Ok(0)
        }
        Command::Show(args) => {
            print_objects(&run_show(&args.path, &args.type_name)?);
            Ok(0)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig::default()
        .with_level(cli.verbosity.tracing_level_filter())
        .with_timestamps(cli.log_timestamps)
        .with_target(cli.log_targets)
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
