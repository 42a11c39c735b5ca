//! Derived urgency classification.

use serde::{Deserialize, Serialize};
use hotelops_core::{priority_weight, Task, Time};

/// How pressing a task is right now. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Nothing pressing
    Low,
    /// Normal priority, on time
    Medium,
    /// Weight-4 priority, or late
    High,
    /// Late and at least normal priority
    Critical,
}

impl Urgency {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Classify `task` at `now`.
///
/// Overdue tasks of weight 3 or more are critical. Other overdue tasks and
/// tasks of weight exactly 4 are high, and weight 3 is medium. On-time tasks
/// of weight 5 fall through to low.
pub fn urgency(task: &Task, now: Time) -> Urgency {
    let weight = priority_weight(task.priority);
    let overdue = task.is_overdue(now);

    if overdue && weight >= 3 {
        Urgency::Critical
    } else if overdue || weight == 4 {
        Urgency::High
    } else if weight == 3 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{base_time, task};
    use chrono::Duration;
    use hotelops_core::{Priority, TaskStatus};

    #[test]
    fn test_overdue_urgent_is_critical() {
        let mut t = task(TaskStatus::InProgress, Priority::Urgent);
        t.due_date = base_time() - Duration::days(1);
        assert_eq!(urgency(&t, base_time()), Urgency::Critical);
    }

    #[test]
    fn test_overdue_low_is_high() {
        let mut t = task(TaskStatus::Assigned, Priority::Low);
        t.due_date = base_time() - Duration::hours(1);
        assert_eq!(urgency(&t, base_time()), Urgency::High);
    }

    #[test]
    fn test_on_time_classification_by_weight() {
        let now = base_time();
        assert_eq!(urgency(&task(TaskStatus::Pending, Priority::Low), now), Urgency::Low);
        assert_eq!(urgency(&task(TaskStatus::Pending, Priority::Normal), now), Urgency::Medium);
        assert_eq!(urgency(&task(TaskStatus::Pending, Priority::High), now), Urgency::High);
        assert_eq!(urgency(&task(TaskStatus::Pending, Priority::Critical), now), Urgency::Low);
    }

    #[test]
    fn test_on_time_urgent_is_low() {
        let t = task(TaskStatus::Pending, Priority::Urgent);
        assert!(t.due_date >= base_time());
        assert_eq!(urgency(&t, base_time()), Urgency::Low);
    }

    #[test]
    fn test_terminal_tasks_are_never_overdue() {
        let mut t = task(TaskStatus::Completed, Priority::Normal);
        t.due_date = base_time() - Duration::days(3);
        assert_eq!(urgency(&t, base_time()), Urgency::Medium);
    }

    #[test]
    fn test_urgency_orders_low_to_critical() {
        assert!(Urgency::Low < Urgency::Medium);
        assert!(Urgency::High < Urgency::Critical);
        assert_eq!(serde_json::to_string(&Urgency::Critical).unwrap(), "\"critical\"");
    }

    #[test]
    fn test_display_uses_label_and_honours_width() {
        assert_eq!(Urgency::Medium.to_string(), "medium");
        assert_eq!(format!("{:<8}|", Urgency::High), "high    |");
    }
}
