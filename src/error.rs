//! Error types for the Shoot scheduler

use crate::candidates::SchedulingError;
use std::fmt;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur while scheduling Shoots
#[derive(Debug)]
pub enum SchedulerError {
    /// Kubernetes API error
    KubeApi(String),
    /// Configuration error
    Configuration(String),
    /// Serialization error
    Serialization(String),
    /// Referenced resource not found
    NotFound(String),
    /// The candidate pipeline produced no Seed
    Scheduling(SchedulingError),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::KubeApi(msg) => write!(f, "Kubernetes API error: {}", msg),
            SchedulerError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            SchedulerError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            SchedulerError::NotFound(msg) => write!(f, "Resource not found: {}", msg),
            // Scheduling failures surface verbatim; their text ends up in events
            SchedulerError::Scheduling(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<kube::Error> for SchedulerError {
    fn from(err: kube::Error) -> Self {
        SchedulerError::KubeApi(err.to_string())
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<SchedulingError> for SchedulerError {
    fn from(err: SchedulingError) -> Self {
        SchedulerError::Scheduling(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedulerError::KubeApi("test error".to_string());
        assert!(err.to_string().contains("Kubernetes API error"));
    }

    #[test]
    fn test_scheduling_error_is_passed_through() {
        let err = SchedulerError::Scheduling(SchedulingError::NoUsableSeeds { considered: 4 });
        assert_eq!(
            err.to_string(),
            "none of the 4 seeds is valid for scheduling (not deleting, visible and ready)"
        );
    }

    #[test]
    fn test_error_variants() {
        let errors = vec![
            SchedulerError::KubeApi("api".to_string()),
            SchedulerError::Configuration("config".to_string()),
            SchedulerError::Serialization("serde".to_string()),
            SchedulerError::NotFound("resource".to_string()),
        ];

        for err in errors {
            // Ensure Display is implemented
            let _ = format!("{}", err);
        }
    }
}
