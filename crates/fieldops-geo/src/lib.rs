//! # fieldops-geo — Geospatial Candidate Selection
//!
//! Pure, stateless computation over agent data supplied by the caller:
//!
//! - **Distance** ([`distance`]): Haversine great-circle distance between
//!   two coordinates, Earth radius 6371.0 km.
//!
//! - **Selection** ([`select`]): Nearest selectable agent to an origin,
//!   with a documented deterministic tie-break (lowest agent identifier)
//!   — the naive floating-point minimum has no tie-break guarantee.

pub mod distance;
pub mod select;

pub use distance::{distance_km, EARTH_RADIUS_KM};
pub use select::nearest;
