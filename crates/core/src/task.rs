//! Task model - servicing (housekeeping) and repair (maintenance) tasks.

use serde::{Deserialize, Serialize};
use crate::id::{StaffId, TaskId, TenantId};
use crate::Time;

/// A task tracked by the operations desk.
///
/// Both families share one shape; repair-only fields stay `None` on servicing
/// tasks. The family is derived from [`TaskKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Family and subtype
    pub kind: TaskKind,

    /// Current status
    pub status: TaskStatus,

    /// Priority level
    pub priority: Priority,

    /// Room the task is for, if any
    pub room_number: Option<String>,

    /// Floor the task is on, if any
    pub floor_number: Option<i32>,

    /// Equipment under repair (repair tasks)
    pub equipment_type: Option<String>,

    /// Estimated duration in minutes
    pub estimated_duration: u32,

    /// Estimated cost (repair tasks)
    pub estimated_cost: Option<f64>,

    /// Actual duration in minutes, set on completion
    pub actual_duration: Option<u32>,

    /// Actual cost, set on completion (repair tasks)
    pub actual_cost: Option<f64>,

    /// Parts consumed, set on completion (repair tasks)
    pub parts_used: Option<String>,

    /// Quality rating 1-5, set on completion
    pub rating: Option<u8>,

    /// Assigned staff member
    pub assigned_staff_id: Option<StaffId>,

    /// Supervising staff member
    pub supervisor_id: Option<StaffId>,

    /// When the task is due
    pub due_date: Time,

    /// When work started
    pub start_time: Option<Time>,

    /// When work completed
    pub completion_time: Option<Time>,

    /// Free-form notes (completion notes, cancellation reasons)
    pub notes: Option<String>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,

    /// Owning tenant
    pub tenant_id: TenantId,
}

impl Task {
    /// Task family.
    pub fn family(&self) -> TaskFamily {
        self.kind.family()
    }

    /// Whether the task reached `Completed` or `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Due date has passed and the task is still open.
    pub fn is_overdue(&self, now: Time) -> bool {
        self.due_date < now && !self.is_terminal()
    }

    /// Bump `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now: Time) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Append a line to the notes.
    pub fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
            _ => note.to_string(),
        });
    }

    /// List every model invariant this record violates.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        match self.status {
            TaskStatus::Pending if self.assigned_staff_id.is_some() => {
                violations.push("pending task has an assignee".to_string());
            }
            TaskStatus::Assigned
            | TaskStatus::InProgress
            | TaskStatus::WaitingForParts
            | TaskStatus::OnHold
                if self.assigned_staff_id.is_none() =>
            {
                violations.push(format!("{} task has no assignee", self.status.label()));
            }
            _ => {}
        }

        if self.status == TaskStatus::Completed {
            match (self.completion_time, self.start_time) {
                (None, _) => violations.push("completed task has no completion time".to_string()),
                (Some(done), Some(started)) if done < started => {
                    violations.push("completion time precedes start time".to_string())
                }
                _ => {}
            }
        } else if self.actual_duration.is_some() || self.actual_cost.is_some() || self.rating.is_some() {
            violations.push("actuals recorded on a task that is not completed".to_string());
        }

        if !self.status.applies_to(self.family()) {
            violations.push(format!(
                "status {} is not valid for {} tasks",
                self.status.label(),
                self.family().label()
            ));
        }

        if self.created_at > self.updated_at {
            violations.push("created_at is after updated_at".to_string());
        }

        violations
    }

    /// Whether the record satisfies every model invariant.
    pub fn satisfies_invariants(&self) -> bool {
        self.invariant_violations().is_empty()
    }
}

/// The two task families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskFamily {
    /// Housekeeping work
    Servicing,
    /// Maintenance work
    Repair,
}

impl TaskFamily {
    /// Both families, servicing first.
    pub const ALL: [TaskFamily; 2] = [TaskFamily::Servicing, TaskFamily::Repair];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TaskFamily::Servicing => "housekeeping",
            TaskFamily::Repair => "maintenance",
        }
    }
}

impl std::fmt::Display for TaskFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TaskFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "servicing" | "housekeeping" => Ok(TaskFamily::Servicing),
            "repair" | "maintenance" => Ok(TaskFamily::Repair),
            other => Err(format!("unknown task family: {other}")),
        }
    }
}

/// Housekeeping task subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServicingType {
    /// Turn a guest room
    RoomCleaning,
    /// Full deep clean
    DeepCleaning,
    /// Linen and guest laundry
    Laundry,
    /// Lobby, corridors and other shared areas
    PublicAreaCleaning,
    /// Count supplies and minibar stock
    InventoryCheck,
    /// Housekeeping report of something broken
    MaintenanceRequest,
}

/// Maintenance task subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairType {
    /// Pipes, drains and fixtures
    Plumbing,
    /// Wiring, sockets and lighting
    Electrical,
    /// Heating, ventilation and air conditioning
    Hvac,
    /// In-room appliances
    ApplianceRepair,
    /// Furniture
    FurnitureRepair,
    /// Paintwork
    Painting,
    /// Carpets and flooring
    CarpetRepair,
    /// Scheduled upkeep
    PreventiveMaintenance,
    /// Urgent breakdown
    EmergencyRepair,
}

/// Task subtype, tagged with its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", content = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// A housekeeping subtype
    Servicing(ServicingType),
    /// A maintenance subtype
    Repair(RepairType),
}

impl TaskKind {
    /// Family this kind belongs to.
    pub fn family(&self) -> TaskFamily {
        match self {
            TaskKind::Servicing(_) => TaskFamily::Servicing,
            TaskKind::Repair(_) => TaskFamily::Repair,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Servicing(t) => match t {
                ServicingType::RoomCleaning => "Room Cleaning",
                ServicingType::DeepCleaning => "Deep Cleaning",
                ServicingType::Laundry => "Laundry",
                ServicingType::PublicAreaCleaning => "Public Area Cleaning",
                ServicingType::InventoryCheck => "Inventory Check",
                ServicingType::MaintenanceRequest => "Maintenance Request",
            },
            TaskKind::Repair(t) => match t {
                RepairType::Plumbing => "Plumbing",
                RepairType::Electrical => "Electrical",
                RepairType::Hvac => "HVAC",
                RepairType::ApplianceRepair => "Appliance Repair",
                RepairType::FurnitureRepair => "Furniture Repair",
                RepairType::Painting => "Painting",
                RepairType::CarpetRepair => "Carpet Repair",
                RepairType::PreventiveMaintenance => "Preventive Maintenance",
                RepairType::EmergencyRepair => "Emergency Repair",
            },
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Task status. `OPEN` (maintenance wire name) decodes to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Created, waiting for an assignee
    #[serde(alias = "OPEN")]
    Pending,
    /// Assigned to a staff member
    Assigned,
    /// Work under way
    InProgress,
    /// Blocked on parts (repair tasks only)
    WaitingForParts,
    /// Paused
    OnHold,
    /// Done
    Completed,
    /// Withdrawn
    Cancelled,
}

impl TaskStatus {
    /// Every status in rank order.
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::Pending,
        TaskStatus::Assigned,
        TaskStatus::InProgress,
        TaskStatus::WaitingForParts,
        TaskStatus::OnHold,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Counted as "active" on dashboards.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskStatus::Assigned | TaskStatus::InProgress | TaskStatus::WaitingForParts
        )
    }

    /// Whether a task of `family` may hold this status.
    pub fn applies_to(&self, family: TaskFamily) -> bool {
        !matches!(self, TaskStatus::WaitingForParts) || family == TaskFamily::Repair
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Open",
            TaskStatus::Assigned => "Assigned",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::WaitingForParts => "Waiting for Parts",
            TaskStatus::OnHold => "On Hold",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "PENDING" | "OPEN" => Ok(TaskStatus::Pending),
            "ASSIGNED" => Ok(TaskStatus::Assigned),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "WAITING_FOR_PARTS" => Ok(TaskStatus::WaitingForParts),
            "ON_HOLD" => Ok(TaskStatus::OnHold),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "CANCELLED" => Ok(TaskStatus::Cancelled),
            _ => Err(format!("unknown task status: {s}")),
        }
    }
}

/// Priority level, ordered from least to most pressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Whenever convenient
    Low,
    /// Default
    Normal,
    /// Ahead of normal work
    High,
    /// Drop other work
    Urgent,
    /// Same weight as urgent
    Critical,
}

impl Priority {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
            Priority::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "NORMAL" | "MEDIUM" => Ok(Priority::Normal),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            "CRITICAL" => Ok(Priority::Critical),
            _ => Err(format!("unknown priority: {s}")),
        }
    }
}

/// Returns true for housekeeping tasks.
pub fn is_servicing_task(task: &Task) -> bool {
    matches!(task.kind, TaskKind::Servicing(_))
}

/// Returns true for maintenance tasks.
pub fn is_repair_task(task: &Task) -> bool {
    matches!(task.kind, TaskKind::Repair(_))
}

/// Urgency weight of a priority, in `1..=5`.
///
/// Urgent and Critical share the top weight.
pub fn priority_weight(priority: Priority) -> u8 {
    match priority {
        Priority::Low => 2,
        Priority::Normal => 3,
        Priority::High => 4,
        Priority::Urgent | Priority::Critical => 5,
    }
}

/// Fixed display rank of a status (open work first, closed work last).
pub fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Pending => 1,
        TaskStatus::Assigned => 2,
        TaskStatus::InProgress => 3,
        TaskStatus::WaitingForParts => 4,
        TaskStatus::OnHold => 5,
        TaskStatus::Completed => 6,
        TaskStatus::Cancelled => 7,
    }
}

/// Format minutes as `45m`, `2h` or `1h 30m`.
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}
