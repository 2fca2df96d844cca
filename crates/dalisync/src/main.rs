mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dalisync_core::Coordinator;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Commands that never talk to a configured gateway
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Discover(args) => commands::discover::handle(args, &cli.global).await,

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "dalisync", &mut std::io::stdout());
            Ok(())
        }

        // Watch keeps the coordinator running with periodic refresh
        Command::Watch(args) => {
            let mut controller_config = config::resolve(&cli.global, &config::load_config()?)?;
            if let Some(secs) = args.interval {
                controller_config = controller_config.with_refresh_interval(Duration::from_secs(secs));
            }
            let coordinator = Coordinator::with_http(controller_config)?;
            coordinator.start().await?;
            let result = commands::watch::handle(&coordinator, &cli.global).await;
            coordinator.shutdown().await;
            result
        }

        // Everything else is one request-response cycle
        cmd => {
            let controller_config = config::resolve(&cli.global, &config::load_config()?)?
                .with_refresh_interval(Duration::ZERO);
            let coordinator = Coordinator::with_http(controller_config)?;
            coordinator.start().await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &coordinator, &cli.global).await;
            coordinator.shutdown().await;
            result
        }
    }
}
