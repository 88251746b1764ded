//! Validation errors for domain primitive construction.

use thiserror::Error;

/// Error returned when a domain primitive fails validation at
/// construction or deserialization time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Latitude outside [-90, 90] degrees.
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180] degrees.
    #[error("longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// NaN or infinite coordinate component.
    #[error("coordinate components must be finite, got ({0}, {1})")]
    NonFiniteCoordinate(f64, f64),

    /// A required text field was empty or whitespace-only.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}
