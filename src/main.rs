//! sdb - smart container image builds
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use sdb::cli::{commands, Cli, Commands};
use sdb::config::{Config, ConfigManager};
use sdb::error::SdbResult;
use std::process::ExitCode;
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
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output on stdout stays machine readable
fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("sdb=warn"),
        1 => EnvFilter::new("sdb=info"),
        _ => EnvFilter::new("sdb=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time();

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> SdbResult<()> {
    let cli = Cli::parse();

    let manager = ConfigManager::from_option(cli.config.clone());
    let config = manager.load().await?;

    init_logging(cli.verbose, &config);
    sdb::ui::init_theme();

    match cli.command {
        Commands::Build(args) => commands::build(args, &config).await,
        Commands::Fingerprint(args) => commands::fingerprint(args).await,
        Commands::Tags(args) => commands::tags(args).await,
        Commands::Facts(args) => commands::facts(args, &config).await,
        Commands::Config(args) => commands::config(args, &manager, &config).await,
    }
}
