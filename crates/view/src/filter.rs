//! Conjunctive task filtering.

use hotelops_core::{Task, TaskFilter};

/// Whether `task` satisfies every populated field of `filter`.
pub fn matches_filter(task: &Task, filter: &TaskFilter) -> bool {
    if !filter.status.is_empty() && !filter.status.contains(&task.status) {
        return false;
    }
    if !filter.priority.is_empty() && !filter.priority.contains(&task.priority) {
        return false;
    }
    if !filter.kind.is_empty() && !filter.kind.contains(&task.kind) {
        return false;
    }
    if let Some(staff) = filter.assigned_staff_id {
        if task.assigned_staff_id != Some(staff) {
            return false;
        }
    }
    if let Some(from) = filter.date_from {
        if task.due_date < from {
            return false;
        }
    }
    if let Some(to) = filter.date_to {
        if task.due_date > to {
            return false;
        }
    }
    if let Some(needle) = filter.room_number.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let needle = needle.to_lowercase();
        let hit = task
            .room_number
            .as_deref()
            .is_some_and(|room| room.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if let Some(floor) = filter.floor_number {
        if task.floor_number != Some(floor) {
            return false;
        }
    }
    true
}

/// Tasks passing `filter`, in their original order.
pub fn apply_filters<'a, I>(tasks: I, filter: &TaskFilter) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|task| matches_filter(task, filter)).collect()
}
