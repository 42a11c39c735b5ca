//! Recent-activity feed.

use serde::{Deserialize, Serialize};
use hotelops_core::{Priority, StaffId, Task, TaskFamily, TaskId, TaskStatus, Time};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    /// Task finished
    Completed,
    /// Work began
    Started,
    /// Task handed to a staff member
    Assigned,
}

impl ActivityAction {
    /// Past-tense verb.
    pub fn verb(&self) -> &'static str {
        match self {
            ActivityAction::Completed => "completed",
            ActivityAction::Started => "started",
            ActivityAction::Assigned => "assigned",
        }
    }
}

/// One feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    /// Task concerned
    pub task_id: TaskId,
    /// Its family
    pub family: TaskFamily,
    /// Event
    pub action: ActivityAction,
    /// Human description
    pub description: String,
    /// When it happened
    pub timestamp: Time,
    /// Task priority
    pub priority: Priority,
    /// Assignee, if any
    pub staff_id: Option<StaffId>,
    /// Room, if any
    pub room_number: Option<String>,
}

/// Events from both families, newest first, at most `limit` of them.
///
/// Completions are stamped with the completion time, starts with the start
/// time, and tasks currently `Assigned` with their last update. Equal
/// timestamps keep collection order.
pub fn recent_activity(tasks: &[Task], limit: usize) -> Vec<RecentActivity> {
    let mut events = Vec::new();
    for task in tasks {
        if let Some(at) = task.completion_time.filter(|_| task.status == TaskStatus::Completed) {
            events.push(event(task, ActivityAction::Completed, at));
        }
        if let Some(at) = task.start_time {
            events.push(event(task, ActivityAction::Started, at));
        }
        if task.status == TaskStatus::Assigned {
            events.push(event(task, ActivityAction::Assigned, task.updated_at));
        }
    }

    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(limit);
    events
}

fn event(task: &Task, action: ActivityAction, timestamp: Time) -> RecentActivity {
    let place = task
        .room_number
        .as_deref()
        .map(|room| format!(" (room {room})"))
        .unwrap_or_default();
    RecentActivity {
        task_id: task.id,
        family: task.family(),
        action,
        description: format!("{} task {}: {}{}", task.kind.label(), action.verb(), task.title, place),
        timestamp,
        priority: task.priority,
        staff_id: task.assigned_staff_id,
        room_number: task.room_number.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::tests::{cleaning, plumbing, task};
    use chrono::Duration;

    #[test]
    fn test_feed_merges_families_newest_first() {
        let mut done = task(cleaning(), TaskStatus::Completed, Some(1));
        done.start_time = Some(done.created_at + Duration::minutes(10));
        done.completion_time = Some(done.created_at + Duration::minutes(50));

        let mut working = task(plumbing(), TaskStatus::InProgress, Some(2));
        working.start_time = Some(working.created_at + Duration::minutes(30));

        let mut assigned = task(plumbing(), TaskStatus::Assigned, Some(3));
        assigned.updated_at = assigned.created_at + Duration::minutes(20);

        let feed = recent_activity(&[done.clone(), working.clone(), assigned.clone()], 10);
        let actions: Vec<_> = feed.iter().map(|e| (e.task_id, e.action)).collect();
        assert_eq!(
            actions,
            vec![
                (done.id, ActivityAction::Completed),
                (working.id, ActivityAction::Started),
                (assigned.id, ActivityAction::Assigned),
                (done.id, ActivityAction::Started),
            ]
        );
        assert!(feed[0].description.contains("Room Cleaning task completed"));
        assert_eq!(feed[1].family, TaskFamily::Repair);
    }

    #[test]
    fn test_feed_truncates_to_limit() {
        let tasks: Vec<Task> = (0..10)
            .map(|i| {
                let mut t = task(cleaning(), TaskStatus::Assigned, Some(1));
                t.updated_at = t.created_at + Duration::minutes(i);
                t
            })
            .collect();
        let feed = recent_activity(&tasks, 6);
        assert_eq!(feed.len(), 6);
        assert_eq!(feed[0].task_id, tasks[9].id);
        assert!(recent_activity(&tasks, 0).is_empty());
    }

    #[test]
    fn test_pending_tasks_produce_no_events() {
        assert!(recent_activity(&[task(cleaning(), TaskStatus::Pending, None)], 6).is_empty());
    }
}
