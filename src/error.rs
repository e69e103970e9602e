//! Error types shared across the crate.
//!
//! Only recoverable set-up failures are represented here. Misuse of the
//! numerical kernels (out-of-range stencils, reading unfinished
//! accumulators, stale spectral plans) panics instead.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid grid, parameter or extraction configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// An array does not have the extent required by the grid or accumulator.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being checked
        what: String,
        /// Required extent
        expected: usize,
        /// Extent actually supplied
        actual: usize,
    },

    /// A required host matrix was not supplied.
    #[error("missing matrix '{0}'")]
    MissingMatrix(String),

    /// A matrix name or index is not part of the known set.
    #[error("unknown matrix '{0}'")]
    UnknownMatrix(String),

    /// The normalisation factor of a phasor accumulator is unusable.
    #[error("cannot normalise phasors: {0}")]
    Normalisation(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DimensionMismatch {
            what: "vertices".into(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch for vertices: expected 3, got 2"
        );
        assert_eq!(
            Error::MissingMatrix("Nt".into()).to_string(),
            "missing matrix 'Nt'"
        );
    }
}
