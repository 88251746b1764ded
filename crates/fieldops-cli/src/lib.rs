//! # fieldops-cli — Operator CLI for the FieldOps Dispatch Stack
//!
//! Provides the `fieldops` command-line interface for operating a
//! running `fieldops-api` instance over HTTP.
//!
//! ## Subcommands
//!
//! - `fieldops agent` — Register agents, list the pool, toggle
//!   availability (including returning an agent to the pool after a
//!   completed job).
//! - `fieldops request` — Create service requests, inspect their
//!   dispatch state, and submit agent accept/reject responses.
//!
//! ```bash
//! fieldops agent add --name Bilal --shop "Clifton Motors" \
//!     --phone 0300-5550100 --city Karachi --latitude 24.86 --longitude 67.0
//! fieldops request create --user-id <uuid> --help-type "dent repair" \
//!     --latitude 24.9 --longitude 67.1
//! fieldops request respond <request-id> --action reject
//! ```

pub mod agent;
pub mod client;
pub mod request;

pub use client::ApiClient;
