mod cli;
mod config;
mod errors;
mod processing;

use clap::Parser;
use cli::Cli;
use config::Config;
use errors::CliError;
use psmrescore::ModelCatalog;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn run() -> Result<(), CliError> {
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    config.apply_overrides(&args);

    let catalog = ModelCatalog::builtin();
    processing::process_document(&config, &catalog)
}

fn main() {
    // This uses the RUST_LOG environment variable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}
