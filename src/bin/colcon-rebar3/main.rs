//! colcon-rebar3 CLI - identify and build rebar3 packages

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    let filter = if cli.verbose {
        EnvFilter::new("colcon_rebar3=debug")
    } else {
        EnvFilter::new("colcon_rebar3=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Identify(args) => commands::identify::execute(args, cli.verbose).map(|()| 0),
        Commands::Scan(args) => commands::scan::execute(args, cli.verbose).map(|()| 0),
        Commands::Build(args) => commands::build::execute(args, cli.verbose).await,
        Commands::Completions(args) => commands::completions::execute(args).map(|()| 0),
    }
}
