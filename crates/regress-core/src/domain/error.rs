//! Domain-level error taxonomy for regression suites.

/// Errors produced by the regression core.
#[derive(Debug, thiserror::Error)]
pub enum RegressError {
    #[error("invalid suite configuration: {0}")]
    Config(String),

    #[error("comparator failed for {kind}: {reason}")]
    Comparator { kind: String, reason: String },

    #[error("scheduler failure: {0}")]
    Scheduler(String),
}

/// Result type for regression core operations.
pub type Result<T> = std::result::Result<T, RegressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = RegressError::Config("no build selected".to_string());
        assert!(err.to_string().contains("invalid suite configuration"));
        assert!(err.to_string().contains("no build selected"));
    }

    #[test]
    fn test_scheduler_error_display() {
        let err = RegressError::Scheduler("suite task failed: panicked".to_string());
        assert_eq!(err.to_string(), "scheduler failure: suite task failed: panicked");
    }

    #[test]
    fn test_comparator_error_display() {
        let err = RegressError::Comparator {
            kind: "eso".to_string(),
            reason: "unreadable".to_string(),
        };
        assert!(err.to_string().contains("comparator failed for eso"));
    }
}
