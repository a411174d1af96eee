use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ts_cli::commands::{check_config, sync};
use ts_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Sync(args)) => {
            let config =
                Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
            tracing::debug!(?config, "loaded configuration");
            let report = sync::run(args, &config)?;
            if args.dry_run {
                println!(
                    "{} records checked: {} entries missing, {} already present",
                    report.records, report.created, report.skipped
                );
            } else {
                println!(
                    "{} records reconciled: {} entries created, {} already present",
                    report.records, report.created, report.skipped
                );
            }
        }
        Some(Commands::CheckConfig) => {
            let config =
                Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
            check_config::run(&mut std::io::stdout(), &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
