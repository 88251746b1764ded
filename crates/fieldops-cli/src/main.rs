//! # fieldops CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Uses clap derive macros; all subcommands operate against a running
//! `fieldops-api` instance over HTTP.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fieldops_cli::agent::{run_agent, AgentArgs};
use fieldops_cli::request::{run_request, RequestArgs};
use fieldops_cli::ApiClient;

/// FieldOps dispatch stack CLI.
///
/// Operator tooling for the dispatch service: agent pool management and
/// service request lifecycle operations.
#[derive(Parser, Debug)]
#[command(name = "fieldops", version = "0.3.2", about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the fieldops-api instance. Falls back to
    /// FIELDOPS_API_URL, then http://localhost:8080.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Field agent administration (add, list, availability, history).
    Agent(AgentArgs),

    /// Service request operations (create, show, respond, per-user).
    Request(RequestArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let api_url = cli
        .api_url
        .or_else(|| std::env::var("FIELDOPS_API_URL").ok())
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    tracing::debug!(%api_url, "fieldops CLI starting");

    let client = ApiClient::new(api_url);

    let result = match cli.command {
        Commands::Agent(args) => run_agent(&client, &args).await,
        Commands::Request(args) => run_request(&client, &args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
