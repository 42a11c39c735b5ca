//! Task filter state.

use serde::{Deserialize, Serialize};
use crate::id::StaffId;
use crate::task::{Priority, TaskKind, TaskStatus};
use crate::Time;

/// Filter for querying tasks. Every field is optional; an unset field (or an
/// empty list) places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    /// Status must be one of these
    #[serde(default)]
    pub status: Vec<TaskStatus>,

    /// Priority must be one of these
    #[serde(default)]
    pub priority: Vec<Priority>,

    /// Kind must be one of these
    #[serde(default)]
    pub kind: Vec<TaskKind>,

    /// Assigned to this staff member
    pub assigned_staff_id: Option<StaffId>,

    /// Due on or after
    pub date_from: Option<Time>,

    /// Due on or before
    pub date_to: Option<Time>,

    /// Room number contains (case-insensitive)
    pub room_number: Option<String>,

    /// Exact floor
    pub floor_number: Option<i32>,
}

impl TaskFilter {
    /// True when no field constrains anything.
    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
            && self.priority.is_empty()
            && self.kind.is_empty()
            && self.assigned_staff_id.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.room_number.as_deref().map_or(true, |r| r.trim().is_empty())
            && self.floor_number.is_none()
    }
}
