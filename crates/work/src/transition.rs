//! Task status state machine.

use hotelops_core::{CompletionReport, StaffId, Task, TaskFamily, TaskStatus};

/// A status-changing operation on one task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOperation {
    /// Hand the task to a staff member (also reassigns)
    Assign {
        /// New assignee
        staff_id: StaffId,
    },
    /// Begin work on an assigned task
    Start,
    /// Self-assign if still pending, then begin work
    StartBy {
        /// Staff member starting the work
        staff_id: StaffId,
    },
    /// Pause work
    Hold {
        /// Why work stopped
        reason: Option<String>,
    },
    /// Pause a repair until parts arrive
    HoldForParts,
    /// Continue paused work
    Resume,
    /// Finish the task
    Complete(CompletionReport),
    /// Withdraw the task
    Cancel {
        /// Why it was withdrawn
        reason: Option<String>,
    },
}

impl TaskOperation {
    /// Operation name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            TaskOperation::Assign { .. } => "assign",
            TaskOperation::Start => "start",
            TaskOperation::StartBy { .. } => "start",
            TaskOperation::Hold { .. } => "hold",
            TaskOperation::HoldForParts => "hold for parts",
            TaskOperation::Resume => "resume",
            TaskOperation::Complete(_) => "complete",
            TaskOperation::Cancel { .. } => "cancel",
        }
    }

    /// Operation taking a task in `from` to `to`, carrying `notes`.
    ///
    /// `None` for `Pending` and `Assigned`, which no status change alone
    /// reaches.
    pub fn toward(from: TaskStatus, to: TaskStatus, notes: Option<String>) -> Option<Self> {
        match to {
            TaskStatus::Pending | TaskStatus::Assigned => None,
            TaskStatus::InProgress
                if matches!(from, TaskStatus::OnHold | TaskStatus::WaitingForParts) =>
            {
                Some(TaskOperation::Resume)
            }
            TaskStatus::InProgress => Some(TaskOperation::Start),
            TaskStatus::OnHold => Some(TaskOperation::Hold { reason: notes }),
            TaskStatus::WaitingForParts => Some(TaskOperation::HoldForParts),
            TaskStatus::Completed => Some(TaskOperation::Complete(CompletionReport {
                notes,
                ..CompletionReport::default()
            })),
            TaskStatus::Cancelled => Some(TaskOperation::Cancel { reason: notes }),
        }
    }

    /// Status the task ends in.
    pub fn target(&self) -> TaskStatus {
        match self {
            TaskOperation::Assign { .. } => TaskStatus::Assigned,
            TaskOperation::Start | TaskOperation::StartBy { .. } | TaskOperation::Resume => {
                TaskStatus::InProgress
            }
            TaskOperation::Hold { .. } => TaskStatus::OnHold,
            TaskOperation::HoldForParts => TaskStatus::WaitingForParts,
            TaskOperation::Complete(_) => TaskStatus::Completed,
            TaskOperation::Cancel { .. } => TaskStatus::Cancelled,
        }
    }
}

/// Outcome of checking an operation against a task's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The operation may proceed
    Allowed,
    /// The task is already where the operation leads; nothing changes
    NoOp,
    /// Not permitted from the current status
    Rejected,
}

/// Decides which operations each status permits.
pub struct TransitionValidator;

impl TransitionValidator {
    /// Check `op` against the current state of `task`.
    pub fn validate(task: &Task, op: &TaskOperation) -> Transition {
        let repair = task.family() == TaskFamily::Repair;
        match (task.status, op) {
            (TaskStatus::Pending | TaskStatus::Assigned, TaskOperation::Assign { .. }) => {
                Transition::Allowed
            }

            // Pending tasks have no assignee to start with
            (TaskStatus::Assigned, TaskOperation::Start) => Transition::Allowed,

            (TaskStatus::Pending | TaskStatus::Assigned, TaskOperation::StartBy { .. }) => {
                Transition::Allowed
            }

            (TaskStatus::InProgress, TaskOperation::Hold { .. }) => Transition::Allowed,

            (TaskStatus::InProgress, TaskOperation::HoldForParts) if repair => Transition::Allowed,

            (TaskStatus::OnHold | TaskStatus::WaitingForParts, TaskOperation::Resume) => {
                Transition::Allowed
            }

            (TaskStatus::InProgress, TaskOperation::Complete(_)) => Transition::Allowed,
            (TaskStatus::WaitingForParts, TaskOperation::Complete(_)) if repair => {
                Transition::Allowed
            }

            (TaskStatus::Cancelled, TaskOperation::Cancel { .. }) => Transition::NoOp,
            (status, TaskOperation::Cancel { .. }) if !status.is_terminal() => Transition::Allowed,

            _ => Transition::Rejected,
        }
    }

    /// Whether `from -> to` is a single edge of the status graph for `family`.
    pub fn is_edge(family: TaskFamily, from: TaskStatus, to: TaskStatus) -> bool {
        use TaskStatus::*;
        let repair = family == TaskFamily::Repair;
        match (from, to) {
            (Pending, Assigned) | (Assigned, Assigned) | (Assigned, InProgress) => true,
            (InProgress, Completed) | (InProgress, OnHold) | (OnHold, InProgress) => true,
            (InProgress, WaitingForParts) | (WaitingForParts, InProgress) | (WaitingForParts, Completed) => repair,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}
