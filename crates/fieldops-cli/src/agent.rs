//! # Agent Subcommand
//!
//! Field agent administration against a running API.
//!
//! ## Subcommands
//!
//! - `add` — Register a new agent.
//! - `list` — List the agent pool.
//! - `show` — Show one agent.
//! - `set-availability` — Flip an agent's availability flag (the
//!   operational signal that returns an agent to the pool).
//! - `requests` — Requests offered to an agent.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::client::ApiClient;

/// Arguments for the `fieldops agent` subcommand.
#[derive(Args, Debug)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

/// Agent subcommands.
#[derive(Subcommand, Debug)]
pub enum AgentCommand {
    /// Register a new field agent.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        shop: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        city: String,
        /// Agent latitude. Must be given together with --longitude.
        #[arg(long)]
        latitude: Option<f64>,
        /// Agent longitude. Must be given together with --latitude.
        #[arg(long)]
        longitude: Option<f64>,
        /// Register the agent as initially unavailable.
        #[arg(long)]
        unavailable: bool,
    },

    /// List all registered agents.
    List,

    /// Show a single agent.
    Show {
        /// Agent identifier.
        id: String,
    },

    /// Set an agent's availability flag.
    SetAvailability {
        /// Agent identifier.
        id: String,
        /// `true` to return the agent to the pool, `false` to withdraw it.
        #[arg(long)]
        available: bool,
    },

    /// List requests offered to an agent.
    Requests {
        /// Agent identifier.
        id: String,
    },
}

/// Execute an agent subcommand. Returns the process exit code.
pub async fn run_agent(client: &ApiClient, args: &AgentArgs) -> Result<u8> {
    let output = match &args.command {
        AgentCommand::Add {
            name,
            shop,
            phone,
            city,
            latitude,
            longitude,
            unavailable,
        } => {
            client
                .post(
                    "/v1/agents",
                    &json!({
                        "name": name,
                        "shop": shop,
                        "phone": phone,
                        "city": city,
                        "latitude": latitude,
                        "longitude": longitude,
                        "available": !*unavailable,
                    }),
                )
                .await?
        }
        AgentCommand::List => client.get("/v1/agents").await?,
        AgentCommand::Show { id } => client.get(&format!("/v1/agents/{id}")).await?,
        AgentCommand::SetAvailability { id, available } => {
            client
                .put(
                    &format!("/v1/agents/{id}/availability"),
                    &json!({ "available": available }),
                )
                .await?
        }
        AgentCommand::Requests { id } => client.get(&format!("/v1/agents/{id}/requests")).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}
