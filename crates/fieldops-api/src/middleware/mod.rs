//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`metrics`]: Prometheus-compatible request metrics.
//!
//! Request/response tracing is provided directly by `tower-http`'s
//! `TraceLayer` in the app assembly.

pub mod metrics;
