//! Task execution status as reported by the scheduler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution status of a pipeline task.
///
/// Status is owned by the external scheduler; the resolver only reads it to
/// answer readiness questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has not started.
    #[default]
    Pending,
    /// Task is currently running.
    Running,
    /// Task completed successfully.
    Succeeded,
    /// Task failed after exhausting its retries.
    Failed,
    /// Task was skipped (a guard evaluated false or a parent did not succeed).
    Skipped,
    /// Task was cancelled.
    Cancelled,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl TaskStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Skipped | Self::Cancelled
        )
    }

    /// Returns true if the status unblocks dependents.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_display() {
        assert_eq!(TaskStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(TaskStatus::Skipped.to_string(), "skipped");
    }

    #[test]
    fn test_task_status_is_terminal() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Skipped.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn test_only_succeeded_unblocks() {
        assert!(TaskStatus::Succeeded.is_success());
        assert!(!TaskStatus::Skipped.is_success());
    }

    #[test]
    fn test_task_status_serialize() {
        let json = serde_json::to_string(&TaskStatus::Cancelled).unwrap();
        assert_eq!(json, r#""cancelled""#);

        let deserialized: TaskStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, TaskStatus::Cancelled);
    }
}
