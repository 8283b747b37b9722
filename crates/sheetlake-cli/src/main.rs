//! Sheetlake CLI - classify spreadsheet exports by schema.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use sheetlake::config::LoggingSettings;
use sheetlake::{LakeConfig, Sheetlake};

fn main() {
    let cli = Cli::parse();

    // Logging settings live in the config, so the load is reported once the
    // subscriber exists.
    let config = LakeConfig::load_with_origin(cli.config.as_deref())
        .and_then(|(config, origin)| Ok((config.apply_overrides(cli.overrides())?, origin)));
    let logging = config
        .as_ref()
        .map(|(c, _)| c.logging.clone())
        .unwrap_or_else(|_| LoggingSettings::default());
    let _guard = logging::init(&logging, cli.verbose);

    let config = config.map(|(config, origin)| {
        origin.log();
        config
    });

    let result = config
        .and_then(Sheetlake::new)
        .map_err(Box::<dyn std::error::Error>::from)
        .and_then(|lake| match cli.command {
            Commands::Classify { json, .. } => commands::classify::run(&lake, json),
            Commands::Process { json } => commands::process::run(&lake, json),
            Commands::Inspect { file, json } => commands::inspect::run(&lake, file, json),
        });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
