//! Synchronisation errors

use thiserror::Error;
use cantor_actuator::ActuatorError;
use cantor_core::CurveError;

pub type SyncResult<T> = Result<T, SyncError>;

/// Playback errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Nothing loadable for the session
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Operation not allowed in the player's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Curve problem
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// Driver problem
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_curve_error() {
        let err: SyncError = CurveError::MissingData("song 'x'".into()).into();
        assert!(matches!(err, SyncError::Curve(_)));
        assert_eq!(err.to_string(), "Missing data: song 'x'");
    }

    #[test]
    fn test_from_actuator_error() {
        let err: SyncError = ActuatorError::NotInitialized.into();
        assert_eq!(err, SyncError::Actuator(ActuatorError::NotInitialized));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = SyncError::InvalidState("cannot pause while loaded".into());
        assert!(err.to_string().starts_with("Invalid state"));
    }
}
