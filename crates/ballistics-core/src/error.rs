//! The error taxonomy shared across the ballistics workspace.
//!
//! Every fallible constructor and solver entry point in this workspace
//! returns `Result<T, BallisticError>`. Benign stopping conditions reached
//! during integration (min velocity, max drop, ...) are *not* errors — they
//! are reported as `TerminationReason` on the result, per spec §7.

use thiserror::Error;

/// Errors surfaced by the ballistics core.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BallisticError {
    /// Invalid input at construction time: non-monotonic drag table,
    /// negative BC, humidity outside `[0, 1]`, fewer than two table points.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The requested zero/target distance exceeds the achievable max range
    /// for the shot at the given look angle. Raised before any search.
    #[error(
        "requested distance {requested_ft} ft exceeds max range {max_range_ft} ft at look angle {look_angle_rad} rad"
    )]
    OutOfRange {
        requested_ft: f64,
        max_range_ft: f64,
        look_angle_rad: f64,
    },

    /// A zero-finding or max-range search failed to converge within the
    /// iteration budget.
    #[error(
        "zero-finding did not converge after {iterations} iterations: last angle {last_angle_rad} rad, last error {last_error_ft} ft"
    )]
    ZeroFinding {
        last_angle_rad: f64,
        last_error_ft: f64,
        iterations: u32,
    },

    /// A division-by-zero guard tripped: identical interpolation abscissae,
    /// or a zero-distance correction request.
    #[error("numeric error: {0}")]
    Numeric(String),
}

impl BallisticError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn numeric(msg: impl Into<String>) -> Self {
        Self::Numeric(msg.into())
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = core::result::Result<T, BallisticError>;
