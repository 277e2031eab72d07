// src/error.rs
//
// Errors surfaced to callers of the control facade. Plumbing failures
// (config, sink I/O, image decode) stay in anyhow.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("{0} already active")]
    AlreadyActive(&'static str),

    #[error("switch to manual mode first")]
    ModeConflict,

    #[error("invalid mode: {0:?}")]
    InvalidMode(String),

    #[error("invalid brightness value: {0}")]
    InvalidValue(i64),

    #[error("invalid channel: {0:?}")]
    InvalidChannel(String),

    #[error("no runtime available to schedule the {0} timer")]
    RuntimeUnavailable(&'static str),
}

impl ControlError {
    /// Operation not valid in the current state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ControlError::AlreadyActive(_) | ControlError::ModeConflict)
    }

    /// Malformed input, rejected before any state changes.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ControlError::InvalidMode(_)
                | ControlError::InvalidValue(_)
                | ControlError::InvalidChannel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        assert!(ControlError::AlreadyActive("EV route").is_conflict());
        assert!(ControlError::ModeConflict.is_conflict());
        assert!(ControlError::InvalidValue(300).is_validation());
        assert!(!ControlError::InvalidChannel("c".into()).is_conflict());
        assert!(!ControlError::RuntimeUnavailable("EV Route").is_conflict());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ControlError::AlreadyActive("Incident").to_string(),
            "Incident already active"
        );
        assert_eq!(
            ControlError::InvalidValue(300).to_string(),
            "invalid brightness value: 300"
        );
    }
}
