//! MediScript CLI - Turn a photo of a medical document into a care-plan prompt.

use clap::Parser;
use mediscript_cli::commands;
use mediscript_cli::repl;
use mediscript_cli::{Cli, Command, Config, Formatter};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> mediscript_cli::Result<()> {
    // Load or create config
    let mut config = match &cli.config {
        Some(path) => Config::load_from(Path::new(path))?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("Using default configuration: {}", e);
            Config::default()
        }),
    };

    // Override profile if specified
    if let Some(profile_name) = cli.profile {
        config.switch_profile(profile_name)?;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let api_key = cli.api_key.as_deref();

    match cli.command {
        None | Some(Command::Repl) => {
            repl::run_repl(&config, api_key, &formatter).await?;
        }
        Some(Command::Extract(args)) => {
            commands::execute_extract(args, &config, api_key, &formatter).await?;
        }
        Some(Command::Prompt(args)) => {
            commands::execute_prompt(args, &formatter)?;
        }
        Some(Command::Schema) => {
            commands::execute_schema()?;
        }
        Some(Command::Profile(args)) => {
            commands::execute_profile(args, &mut config, &formatter)?;
        }
    }

    Ok(())
}
