//! # Request Subcommand
//!
//! Service request operations against a running API: intake, state
//! inspection, and the agent-side accept/reject handshake.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::client::ApiClient;

/// Arguments for the `fieldops request` subcommand.
#[derive(Args, Debug)]
pub struct RequestArgs {
    #[command(subcommand)]
    pub command: RequestCommand,
}

/// Request subcommands.
#[derive(Subcommand, Debug)]
pub enum RequestCommand {
    /// Create a service request; the nearest available agent is
    /// assigned immediately.
    Create {
        /// Requesting user identifier.
        #[arg(long)]
        user_id: String,
        /// Help category, e.g. "dent repair".
        #[arg(long)]
        help_type: String,
        #[arg(long)]
        latitude: f64,
        #[arg(long)]
        longitude: f64,
        /// Street address as reported by the user.
        #[arg(long)]
        address: Option<String>,
        /// Pre-computed repair cost estimate.
        #[arg(long)]
        cost_estimate: Option<f64>,
    },

    /// Show a request's dispatch state.
    Show {
        /// Request identifier.
        id: String,
    },

    /// Submit an agent's response to its pending assignment.
    Respond {
        /// Request identifier.
        id: String,
        /// `accept` or `reject`.
        #[arg(long)]
        action: String,
        /// Responding agent identifier; rejected as stale when it no
        /// longer matches the current assignment.
        #[arg(long)]
        agent_id: Option<String>,
    },

    /// List requests raised by a user.
    ForUser {
        /// User identifier.
        id: String,
    },
}

/// Execute a request subcommand. Returns the process exit code.
pub async fn run_request(client: &ApiClient, args: &RequestArgs) -> Result<u8> {
    let output = match &args.command {
        RequestCommand::Create {
            user_id,
            help_type,
            latitude,
            longitude,
            address,
            cost_estimate,
        } => {
            client
                .post(
                    "/v1/requests",
                    &json!({
                        "user_id": user_id,
                        "help_type": help_type,
                        "latitude": latitude,
                        "longitude": longitude,
                        "address": address,
                        "cost_estimate": cost_estimate,
                    }),
                )
                .await?
        }
        RequestCommand::Show { id } => client.get(&format!("/v1/requests/{id}")).await?,
        RequestCommand::Respond {
            id,
            action,
            agent_id,
        } => {
            client
                .post(
                    &format!("/v1/requests/{id}/respond"),
                    &json!({ "action": action, "agent_id": agent_id }),
                )
                .await?
        }
        RequestCommand::ForUser { id } => client.get(&format!("/v1/users/{id}/requests")).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}
