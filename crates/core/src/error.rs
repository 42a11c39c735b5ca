//! Error type shared by the task store, manager and backends.

use std::collections::BTreeMap;
use crate::id::{StaffId, TaskId};
use crate::task::{TaskFamily, TaskStatus};

/// Result alias for operations-core calls.
pub type Result<T> = std::result::Result<T, OpsError>;

/// Field name -> first failing message.
pub type FieldErrors = BTreeMap<String, String>;

/// Errors surfaced by task lifecycle operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpsError {
    /// Create/update payload failed its field rules
    #[error("validation failed: {}", format_field_errors(.0))]
    Validation(FieldErrors),

    /// Operation not permitted from the task's current status
    #[error("cannot {operation} task {task_id} while it is {from}")]
    InvalidTransition {
        /// Task the operation targeted
        task_id: TaskId,
        /// Status the task was in
        from: TaskStatus,
        /// Operation name
        operation: &'static str,
    },

    /// Assignment target is inactive or unqualified
    #[error("staff {staff_id} unavailable: {reason}")]
    StaffUnavailable {
        /// Staff member
        staff_id: StaffId,
        /// Why they cannot take the task
        reason: String,
    },

    /// Nobody qualified and below the workload cap can take the task
    #[error("no {family} staff available for task {task_id}")]
    NoStaffAvailable {
        /// Task waiting for an assignee
        task_id: TaskId,
        /// Family the assignee must belong to
        family: TaskFamily,
    },

    /// Unknown task or staff id
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend call failed; carries the original message
    #[error("{0}")]
    Transport(String),

    /// A backend payload could not be turned into typed entities
    #[error("decode error: {0}")]
    Decode(String),
}

impl OpsError {
    /// Single-field validation error.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), message.into());
        OpsError::Validation(errors)
    }

    /// Whether the caller should reload before retrying.
    pub fn suggests_reload(&self) -> bool {
        matches!(self, OpsError::NotFound(_) | OpsError::InvalidTransition { .. })
    }
}

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
