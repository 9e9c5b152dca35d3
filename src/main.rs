//! IT Reality - command-line entry point

use anyhow::Context;
use clap::Parser;

use itreality::cli::{Cli, exit_codes};
use itreality::{Config, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize rustls crypto provider before any TLS operations
    let _ = rustls::crypto::ring::default_provider().install_default();

    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Failed to load configuration. Check config/ and ITREALITY__* env vars: {}",
                e
            );
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    init_tracing(&config.logging).context("Failed to initialize logging")?;

    let exit_code = itreality::cli::run(cli, config).await?;
    std::process::exit(exit_code);
}
