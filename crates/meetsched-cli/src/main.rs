//! meetsched CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use meetsched_cli::cli::{Cli, Command, ConfigAction};
use meetsched_cli::commands;
use meetsched_cli::config::AppConfig;
use meetsched_cli::error::CliResult;
use meetsched_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match cli.command {
        Command::Serve { json_logs, .. } => TracingConfig::server().with_json(json_logs),
        _ => TracingConfig::cli(),
    }
    .with_debug(cli.debug);

    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = AppConfig::resolve_path(cli.config.as_deref());
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.google.apply_overrides(&cli.google);

    match cli.command {
        Command::Serve { bind, consent, .. } => commands::serve::run(&config, bind, consent).await,
        Command::ConsentUrl => commands::consent::run(&config),
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config_path, &config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
