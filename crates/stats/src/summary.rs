//! Per-family dashboard summaries.

use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use hotelops_core::{Task, TaskFamily, TaskStatus};
use crate::performance::calculate_completion_rate;

/// Summary of one task family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyStats {
    /// Every task of the family
    pub total_tasks: usize,
    /// Waiting for an assignee
    pub pending_tasks: usize,
    /// Assigned, in progress or waiting for parts
    pub active_tasks: usize,
    /// Completed
    pub completed_tasks: usize,
    /// Completed share, whole percent in `0..=100`
    pub completion_rate: u32,
    /// Distinct assignees of active tasks
    pub active_staff_count: usize,
    /// Mean actual minutes over completed tasks that report them
    pub average_task_time: f64,
    /// Sum of actual cost over completed tasks (repair)
    pub total_cost: f64,
    /// Mean actual cost over completed tasks that report it (repair)
    pub average_cost: f64,
}

/// Dashboard summary of both families.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationsStats {
    /// Housekeeping summary
    pub servicing: FamilyStats,
    /// Maintenance summary
    pub repair: FamilyStats,
}

impl OperationsStats {
    /// Summary of one family.
    pub fn family(&self, family: TaskFamily) -> &FamilyStats {
        match family {
            TaskFamily::Servicing => &self.servicing,
            TaskFamily::Repair => &self.repair,
        }
    }
}

/// Summarize the tasks of `family`.
pub fn family_stats<'a, I>(tasks: I, family: TaskFamily) -> FamilyStats
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut stats = FamilyStats::default();
    let mut active_staff = BTreeSet::new();
    let mut durations = Vec::new();
    let mut costs = Vec::new();

    for task in tasks.into_iter().filter(|t| t.family() == family) {
        stats.total_tasks += 1;
        match task.status {
            TaskStatus::Pending => stats.pending_tasks += 1,
            TaskStatus::Completed => {
                stats.completed_tasks += 1;
                if let Some(minutes) = task.actual_duration {
                    durations.push(f64::from(minutes));
                }
                if family == TaskFamily::Repair {
                    if let Some(cost) = task.actual_cost {
                        costs.push(cost);
                    }
                }
            }
            _ => {}
        }
        if task.status.is_active() {
            stats.active_tasks += 1;
            if let Some(staff) = task.assigned_staff_id {
                active_staff.insert(staff);
            }
        }
    }

    stats.completion_rate = calculate_completion_rate(stats.completed_tasks, stats.total_tasks);
    stats.active_staff_count = active_staff.len();
    stats.average_task_time = mean(&durations);
    stats.total_cost = costs.iter().sum();
    stats.average_cost = mean(&costs);
    stats
}

/// Summarize both families.
pub fn operations_stats(tasks: &[Task]) -> OperationsStats {
    let stats = OperationsStats {
        servicing: family_stats(tasks, TaskFamily::Servicing),
        repair: family_stats(tasks, TaskFamily::Repair),
    };
    tracing::debug!(
        servicing = stats.servicing.total_tasks,
        repair = stats.repair.total_tasks,
        "Computed operations stats"
    );
    stats
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
