//! Staff performance.

use serde::{Deserialize, Serialize};
use hotelops_core::{Staff, StaffId, Task, TaskFamily, TaskStatus};

/// Completion figures of one staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffPerformance {
    /// Staff member
    pub staff_id: StaffId,
    /// Display name
    pub staff_name: String,
    /// Family of work
    pub family: TaskFamily,
    /// Completed tasks assigned to this person
    pub tasks_completed: usize,
    /// Mean rating over those tasks, one decimal; 0 when none are rated
    pub average_rating: f64,
    /// Sum of actual durations of those tasks, in hours
    pub total_hours: f64,
    /// Completed tasks per hour, two decimals; 0 when no hours are reported
    pub efficiency: f64,
}

/// `round(completed / total * 100)`, 0 when `total` is 0.
pub fn calculate_completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let rate = (completed as f64 / total as f64 * 100.0).round();
    rate.clamp(0.0, 100.0) as u32
}

/// Mean rating rounded to one decimal, 0 when `ratings` is empty.
pub fn calculate_average_rating(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
    let mean = f64::from(sum) / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// `round(completed / hours * 100) / 100`, 0 when `hours` is not positive.
pub fn calculate_efficiency(completed: usize, hours: f64) -> f64 {
    if hours <= 0.0 || !hours.is_finite() {
        return 0.0;
    }
    (completed as f64 / hours * 100.0).round() / 100.0
}

/// Performance of every staff member, in roster order.
pub fn staff_performance(staff: &[Staff], tasks: &[Task]) -> Vec<StaffPerformance> {
    staff.iter().map(|member| performance_of(member, tasks)).collect()
}

fn performance_of(member: &Staff, tasks: &[Task]) -> StaffPerformance {
    let completed: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed && t.assigned_staff_id == Some(member.id))
        .collect();

    let ratings: Vec<u8> = completed.iter().filter_map(|t| t.rating).collect();
    let minutes: u64 = completed
        .iter()
        .filter_map(|t| t.actual_duration)
        .map(u64::from)
        .sum();
    let total_hours = minutes as f64 / 60.0;

    StaffPerformance {
        staff_id: member.id,
        staff_name: member.name.clone(),
        family: member.family,
        tasks_completed: completed.len(),
        average_rating: calculate_average_rating(&ratings),
        total_hours,
        efficiency: calculate_efficiency(completed.len(), total_hours),
    }
}

/// Recompute the derived aggregates stored on staff records.
pub fn refresh_staff_aggregates(staff: &mut [Staff], tasks: &[Task]) {
    for member in staff.iter_mut() {
        let perf = performance_of(member, tasks);
        member.average_rating = perf.average_rating;
        member.total_tasks_completed = u32::try_from(perf.tasks_completed).unwrap_or(u32::MAX);
    }
    tracing::debug!(count = staff.len(), "Refreshed staff aggregates");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::tests::{cleaning, task};
    use hotelops_core::TenantId;

    fn member(id: u64) -> Staff {
        Staff {
            id: StaffId(id),
            user_id: id * 10,
            name: format!("Staff {id}"),
            family: TaskFamily::Servicing,
            specializations: vec![],
            is_active: true,
            average_rating: 0.0,
            total_tasks_completed: 0,
            tenant_id: TenantId::new("hotel-1"),
        }
    }

    fn completed(staff: u64, minutes: Option<u32>, rating: Option<u8>) -> Task {
        let mut t = task(cleaning(), TaskStatus::Completed, Some(staff));
        t.actual_duration = minutes;
        t.rating = rating;
        t
    }

    #[test]
    fn test_zero_denominators_give_zero() {
        assert_eq!(calculate_completion_rate(0, 0), 0);
        assert_eq!(calculate_average_rating(&[]), 0.0);
        assert_eq!(calculate_efficiency(3, 0.0), 0.0);
        assert_eq!(calculate_efficiency(3, f64::NAN), 0.0);
    }

    #[test]
    fn test_formulas() {
        assert_eq!(calculate_completion_rate(1, 3), 33);
        assert_eq!(calculate_completion_rate(3, 3), 100);
        assert_eq!(calculate_average_rating(&[5, 4, 4]), 4.3);
        assert_eq!(calculate_efficiency(3, 2.0), 1.5);
        assert_eq!(calculate_efficiency(1, 3.0), 0.33);
    }

    #[test]
    fn test_staff_performance_counts_only_own_completed_tasks() {
        let staff = vec![member(7), member(8)];
        let tasks = vec![
            completed(7, Some(40), Some(5)),
            completed(7, Some(80), None),
            completed(8, None, Some(3)),
            task(cleaning(), TaskStatus::InProgress, Some(7)),
        ];

        let perf = staff_performance(&staff, &tasks);
        assert_eq!(perf[0].tasks_completed, 2);
        assert_eq!(perf[0].average_rating, 5.0);
        assert_eq!(perf[0].total_hours, 2.0);
        assert_eq!(perf[0].efficiency, 1.0);

        assert_eq!(perf[1].tasks_completed, 1);
        assert_eq!(perf[1].total_hours, 0.0);
        assert_eq!(perf[1].efficiency, 0.0);
    }

    #[test]
    fn test_unrated_staff_is_not_given_a_rating() {
        let perf = staff_performance(&[member(9)], &[completed(9, Some(30), None)]);
        assert_eq!(perf[0].average_rating, 0.0);
        assert_eq!(perf[0].tasks_completed, 1);
    }

    #[test]
    fn test_refresh_staff_aggregates() {
        let mut staff = vec![member(7)];
        refresh_staff_aggregates(&mut staff, &[completed(7, Some(40), Some(4)), completed(7, None, Some(5))]);
        assert_eq!(staff[0].total_tasks_completed, 2);
        assert_eq!(staff[0].average_rating, 4.5);
    }
}
