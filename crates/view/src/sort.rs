//! Stable task orderings.

use serde::{Deserialize, Serialize};
use hotelops_core::{status_rank, Task, Time};
use crate::urgency::urgency;

/// Sort order of a task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    /// Most urgent first, then earliest due
    #[default]
    Urgency,
    /// Earliest due first
    DueDate,
    /// Open work first, closed work last
    Status,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "urgency" | "priority" => Ok(SortOrder::Urgency),
            "due_date" | "due" => Ok(SortOrder::DueDate),
            "status" => Ok(SortOrder::Status),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Sort in place. Stable: ties keep their prior relative order.
pub fn sort_tasks(tasks: &mut [&Task], order: SortOrder, now: Time) {
    match order {
        SortOrder::Urgency => tasks.sort_by(|a, b| {
            urgency(b, now)
                .cmp(&urgency(a, now))
                .then_with(|| a.due_date.cmp(&b.due_date))
        }),
        SortOrder::DueDate => tasks.sort_by_key(|task| task.due_date),
        SortOrder::Status => tasks.sort_by_key(|task| status_rank(task.status)),
    }
}
