//! Error types for registration operations.

use thiserror::Error;

/// Main error type for registration operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// The volumes cannot be compared at the starting transform: constant
    /// intensity, or too few fixed samples land inside the moving grid.
    #[error("Insufficient overlap: {0}")]
    InsufficientOverlap(String),

    /// The cost stopped improving after the step length had already been
    /// relaxed at least once.
    #[error(
        "Registration diverged: no improvement for {stagnant_iterations} consecutive iterations \
         after {iterations} in total (best cost {best_cost:.6})"
    )]
    Divergence {
        iterations: usize,
        stagnant_iterations: usize,
        best_cost: f64,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The caller's cancellation token fired.
    #[error("Registration cancelled")]
    Cancelled,
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create an insufficient overlap error.
    pub fn insufficient_overlap(msg: impl Into<String>) -> Self {
        Self::InsufficientOverlap(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RegistrationError::insufficient_overlap("no samples inside");
        assert!(matches!(err, RegistrationError::InsufficientOverlap(_)));
    }

    #[test]
    fn test_error_display() {
        let err = RegistrationError::invalid_configuration("bins must be at least 2");
        assert_eq!(err.to_string(), "Invalid configuration: bins must be at least 2");

        let err = RegistrationError::Divergence {
            iterations: 120,
            stagnant_iterations: 50,
            best_cost: -0.25,
        };
        let message = err.to_string();
        assert!(message.contains("50 consecutive iterations"), "{}", message);
        assert!(message.contains("after 120 in total"), "{}", message);
    }
}
