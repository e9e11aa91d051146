//! casekit CLI.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use casekit_cli::commands::{case_targets, run_autovnv, run_inspect, run_update, update_banner};
use casekit_cli::logging::{LogConfig, LogFormat, init_logging};
use casekit_cli::summary::{print_campaign_summary, print_display_model, print_update_summary};
use casekit_model::{PackageConfig, Platform};
use casekit_vnv::{CampaignOptions, MailSettings, VnvError};
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{AutovnvArgs, Cli, Command, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            error
                .downcast_ref::<VnvError>()
                .map_or(1, VnvError::exit_code)
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    let package = PackageConfig::resolve(cli.package_config.as_deref())
        .context("load package configuration")?;
    let cwd = std::env::current_dir().context("determine working directory")?;
    let quiet = cli.verbosity.tracing_level_filter() < LevelFilter::WARN;

    match &cli.command {
        Command::Update(args) => {
            let cases = case_targets(&args.cases, &args.positional);
            if !quiet {
                println!("{}\n", update_banner(&package));
            }
            let updates = run_update(&package, &cases, &cwd, Platform::current(), quiet)?;
            if !quiet {
                print_update_summary(&updates);
            }
            Ok(0)
        }
        Command::Autovnv(args) => {
            let options = campaign_options(args, &cwd);
            let outcome = run_autovnv(&package, &options)?;
            if !quiet {
                print_campaign_summary(&outcome);
            }
            Ok(0)
        }
        Command::Inspect(args) => {
            let form = run_inspect(&package, args.dir.as_deref(), args.xml.as_deref(), &cwd);
            if let Some(warning) = form.open_warning() {
                eprintln!("warning: {warning}");
            }
            print_display_model(form.display(), form.identity());
            Ok(0)
        }
    }
}

fn campaign_options(args: &AutovnvArgs, cwd: &std::path::Path) -> CampaignOptions {
    let mut options = CampaignOptions::new(cwd.join(&args.file));
    options.update_repository = args.update;
    options.run = args.run;
    options.compare = args.compare;
    options.postprocess = args.post;
    options.recipients = args
        .mail
        .as_deref()
        .map(|addresses| addresses.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    options.mail = MailSettings {
        server: args.smtp_server.clone(),
        port: args.smtp_port,
        from: args.mail_from.clone(),
    };
    options
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level_filter = match cli.log_level {
        Some(LogLevelArg::Error) => LevelFilter::ERROR,
        Some(LogLevelArg::Warn) => LevelFilter::WARN,
        Some(LogLevelArg::Info) => LevelFilter::INFO,
        Some(LogLevelArg::Debug) => LevelFilter::DEBUG,
        Some(LogLevelArg::Trace) => LevelFilter::TRACE,
        None => cli.verbosity.tracing_level_filter(),
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let mut config = LogConfig::default()
        .with_level(level_filter)
        .with_format(format)
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
