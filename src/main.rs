//! bcsched - OpenShift build dependency scheduler
//!
//! CLI entry point that dispatches to subcommands.

use bcsched::cli::{Cli, Commands};
use bcsched::config::{Config, ConfigManager};
use bcsched::error::BcschedResult;
use bcsched::ui::{self, UiContext};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            if e.is_configuration_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run() -> BcschedResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Loaded configuration from {}", config_manager.path().display());

    if UiContext::detect().is_interactive() {
        ui::init_theme();
    }

    match cli.command {
        Commands::Build(args) => bcsched::cli::commands::build(args, &config, cli.namespace).await,
        Commands::Plan(args) => bcsched::cli::commands::plan(args, &config, cli.namespace).await,
        Commands::Config(args) => {
            bcsched::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("bcsched=warn"),
        1 => EnvFilter::new("bcsched=info"),
        _ => EnvFilter::new("bcsched=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }
}
