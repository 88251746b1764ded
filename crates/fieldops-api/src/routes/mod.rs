//! # API Route Modules
//!
//! - `requests` — service request intake, agent accept/reject
//!   responses, request queries.
//! - `agents` — agent administration (create, list, availability) and
//!   per-agent request history.
//! - `sessions` — WebSocket upgrade for per-user live status push.

pub mod agents;
pub mod requests;
pub mod sessions;
