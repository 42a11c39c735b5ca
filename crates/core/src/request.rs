//! Request payloads for creating and transitioning tasks.

use serde::{Deserialize, Serialize};
use crate::id::{StaffId, TaskId, TenantId};
use crate::task::{Priority, Task, TaskFamily, TaskKind, TaskStatus};
use crate::Time;

/// Operator request to create a task.
///
/// `kind`, `priority` and `due_date` are optional here so that a missing
/// value reaches validation as a "required" error instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Family the task is created in
    pub family: TaskFamily,
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Subtype
    pub kind: Option<TaskKind>,
    /// Priority
    pub priority: Option<Priority>,
    /// Room
    pub room_number: Option<String>,
    /// Floor
    pub floor_number: Option<i32>,
    /// Equipment (repair)
    pub equipment_type: Option<String>,
    /// Estimated minutes
    pub estimated_duration: u32,
    /// Estimated cost (repair)
    pub estimated_cost: Option<f64>,
    /// Due date
    pub due_date: Option<Time>,
    /// Supervisor
    pub supervisor_id: Option<StaffId>,
    /// Initial notes
    pub notes: Option<String>,
}

impl CreateTaskRequest {
    /// Minimal request; fill the rest with struct update syntax.
    pub fn new(family: TaskFamily, title: impl Into<String>) -> Self {
        Self {
            family,
            title: title.into(),
            description: String::new(),
            kind: None,
            priority: None,
            room_number: None,
            floor_number: None,
            equipment_type: None,
            estimated_duration: 30,
            estimated_cost: None,
            due_date: None,
            supervisor_id: None,
            notes: None,
        }
    }

    /// Build the `Pending` record this request describes.
    ///
    /// Returns `None` when kind, priority or due date is missing, or the kind
    /// belongs to another family. Blank optional text becomes `None`, and
    /// repair-only fields are dropped for servicing tasks.
    pub fn build(&self, id: TaskId, tenant: &TenantId, now: Time) -> Option<Task> {
        let kind = self.kind.filter(|kind| kind.family() == self.family)?;
        let repair = self.family == TaskFamily::Repair;
        Some(Task {
            id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            kind,
            status: TaskStatus::Pending,
            priority: self.priority?,
            room_number: non_blank(&self.room_number),
            floor_number: self.floor_number,
            equipment_type: non_blank(&self.equipment_type).filter(|_| repair),
            estimated_duration: self.estimated_duration,
            estimated_cost: self.estimated_cost.filter(|_| repair),
            actual_duration: None,
            actual_cost: None,
            parts_used: None,
            rating: None,
            assigned_staff_id: None,
            supervisor_id: self.supervisor_id,
            due_date: self.due_date?,
            start_time: None,
            completion_time: None,
            notes: non_blank(&self.notes),
            created_at: now,
            updated_at: now,
            tenant_id: tenant.clone(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// What actually happened, reported when a task is completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    /// Completion notes
    pub notes: Option<String>,
    /// Minutes spent
    pub actual_duration: Option<u32>,
    /// Money spent (repair)
    pub actual_cost: Option<f64>,
    /// Parts consumed (repair)
    pub parts_used: Option<String>,
    /// Quality rating 1-5
    pub rating: Option<u8>,
}

/// Status change as sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Target status
    pub status: TaskStatus,
    /// Notes (completion notes or cancel reason)
    pub notes: Option<String>,
    /// Minutes spent
    pub actual_duration: Option<u32>,
    /// Money spent
    pub actual_cost: Option<f64>,
    /// Parts consumed
    pub parts_used: Option<String>,
    /// Quality rating
    pub rating: Option<u8>,
}

impl StatusUpdate {
    /// Plain status change.
    pub fn to(status: TaskStatus) -> Self {
        Self {
            status,
            notes: None,
            actual_duration: None,
            actual_cost: None,
            parts_used: None,
            rating: None,
        }
    }

    /// Status change carrying a note.
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Completion carrying the report's actuals.
    pub fn completed(report: &CompletionReport) -> Self {
        Self {
            status: TaskStatus::Completed,
            notes: report.notes.clone(),
            actual_duration: report.actual_duration,
            actual_cost: report.actual_cost,
            parts_used: report.parts_used.clone(),
            rating: report.rating,
        }
    }
}
