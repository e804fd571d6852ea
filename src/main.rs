// src/main.rs

//! The main entry point for the CitrineDB server application.

use anyhow::Result;
use citrinedb::config::Config;
use citrinedb::server;
use std::env;
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--version") {
        println!("CitrineDB version {VERSION}");
        return Ok(());
    }

    // Load the configuration from the command-line flags. The server cannot
    // run without a valid configuration.
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse command-line arguments: {e}");
            std::process::exit(1);
        }
    };

    // Setup logging with compact format and ANSI colors.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact()
        .with_ansi(true)
        .init();

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {e:#}");
        return Err(e);
    }

    Ok(())
}
