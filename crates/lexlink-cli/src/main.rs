//! Lexlink CLI - extract and validate statute interpretation links.

use clap::Parser;
use lexlink_cli::commands;
use lexlink_cli::{Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log to stderr so that stdout carries only results
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> lexlink_cli::Result<()> {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format, !cli.no_color);

    match cli.command {
        Command::Run(args) => commands::execute_run(args, &formatter).await,
        Command::Config(args) => commands::execute_config(args),
    }
}
