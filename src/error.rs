use std::time::Duration;
use thiserror::Error;

/// Errors raised by the configuration and command surfaces around the widget.
///
/// The stepping state machine itself never fails; these cover input that is
/// rejected before it reaches it, plus a runtime that has already stopped.
#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("Delay must be greater than zero (got {0:?})")]
    InvalidDelay(Duration),

    #[error("Capacity must be greater than zero")]
    ZeroCapacity,

    #[error("Target {target} exceeds capacity {max_capacity}")]
    TargetOutOfRange { target: u32, max_capacity: u32 },

    #[error("Initial level {level} exceeds capacity {max_capacity}")]
    LevelOutOfRange { level: u32, max_capacity: u32 },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Unrecognized command: {0}")]
    UnknownCommand(String),

    #[error("Invalid command pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Widget runtime has shut down")]
    RuntimeClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = WidgetError::TargetOutOfRange {
            target: 12,
            max_capacity: 10,
        };
        assert_eq!(err.to_string(), "Target 12 exceeds capacity 10");

        let err = WidgetError::InvalidDelay(Duration::ZERO);
        assert!(err.to_string().contains("greater than zero"));

        assert_eq!(
            WidgetError::UnknownPreset("Knee deep".to_string()).to_string(),
            "Unknown preset: Knee deep"
        );
    }
}
