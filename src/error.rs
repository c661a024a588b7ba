//! Error types for the apex-sim3 library
//!
//! This module provides the crate-level error and result types.
//! All errors use the `thiserror` crate for automatic trait implementations.

use crate::manifold::ManifoldError;
use thiserror::Error;

/// Main result type used throughout the apex-sim3 library
pub type PoseResult<T> = Result<T, PoseError>;

/// Main error type for the apex-sim3 library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoseError {
    /// Manifold operations errors
    #[error("Manifold error: {0}")]
    Manifold(String),

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// General computation errors
    #[error("Computation error: {0}")]
    Computation(String),
}

impl From<ManifoldError> for PoseError {
    fn from(err: ManifoldError) -> Self {
        PoseError::Manifold(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifold::CoordinatesMode;

    #[test]
    fn test_pose_error_display() {
        let error = PoseError::InvalidInput("delta must be positive".to_string());
        assert_eq!(error.to_string(), "Invalid input: delta must be positive");
    }

    #[test]
    fn test_pose_error_from_manifold() {
        let error = PoseError::from(ManifoldError::UnsupportedChartMode(
            CoordinatesMode::FirstOrder,
        ));

        match error {
            PoseError::Manifold(msg) => assert!(msg.contains("FirstOrder")),
            _ => panic!("Expected manifold error"),
        }
    }

    #[test]
    fn test_pose_result_err() {
        let result: PoseResult<f64> = Err(PoseError::Computation("Test error".to_string()));
        assert!(result.is_err());
    }
}
