//! In-memory task store.
//!
//! Holds the task and staff collections of one tenant behind shared
//! snapshots. Every mutation builds a complete new record and swaps it in, so
//! a reader holding an earlier [`TaskStore::snapshot`] never sees a partial
//! update, and a failed operation leaves the store exactly as it was.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use hotelops_core::{
    Clock, CreateTaskRequest, OpsError, Priority, Result, Staff, StaffId, Task, TaskFamily, TaskId,
    TaskStatus, TenantId, Time,
};
use crate::rules::{validate_completion, validate_create};
use crate::transition::{TaskOperation, Transition, TransitionValidator};

/// Proof that a refresh of one family was started.
///
/// Only the most recently issued ticket of a family can be applied; starting
/// another refresh or cancelling invalidates older tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    family: TaskFamily,
    generation: u64,
}

impl RefreshTicket {
    /// Family being refreshed.
    pub fn family(&self) -> TaskFamily {
        self.family
    }
}

fn distinct(task_ids: &[TaskId]) -> impl Iterator<Item = TaskId> + '_ {
    let mut seen = HashSet::new();
    task_ids.iter().copied().filter(move |id| seen.insert(*id))
}

/// Task and staff collections of one tenant.
pub struct TaskStore {
    tenant: TenantId,
    clock: Arc<dyn Clock>,
    tasks: Arc<Vec<Task>>,
    staff: Arc<Vec<Staff>>,
    generations: [u64; 2],
}

fn slot(family: TaskFamily) -> usize {
    match family {
        TaskFamily::Servicing => 0,
        TaskFamily::Repair => 1,
    }
}

impl TaskStore {
    /// Empty store for `tenant`.
    pub fn new(tenant: TenantId, clock: Arc<dyn Clock>) -> Self {
        Self {
            tenant,
            clock,
            tasks: Arc::new(Vec::new()),
            staff: Arc::new(Vec::new()),
            generations: [0; 2],
        }
    }

    /// Builder: initial records.
    pub fn with_records(mut self, tasks: Vec<Task>, staff: Vec<Staff>) -> Self {
        self.tasks = Arc::new(tasks);
        self.staff = Arc::new(staff);
        self
    }

    /// Tenant the store belongs to.
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> Time {
        self.clock.now()
    }

    /// Clock shared with the store.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Shared snapshot of every task.
    pub fn snapshot(&self) -> Arc<Vec<Task>> {
        Arc::clone(&self.tasks)
    }

    /// Every task.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Every staff member.
    pub fn staff(&self) -> &[Staff] {
        &self.staff
    }

    /// Tasks of one family.
    pub fn family_tasks(&self, family: TaskFamily) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.family() == family)
    }

    /// Look a task up.
    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Look a staff member up.
    pub fn find_staff(&self, staff_id: StaffId) -> Option<&Staff> {
        self.staff.iter().find(|s| s.id == staff_id)
    }

    fn require(&self, task_id: TaskId) -> Result<&Task> {
        self.get(task_id).ok_or_else(|| OpsError::NotFound(format!("task {task_id}")))
    }

    // === Lifecycle ===

    /// Validate a create request and add the new `Pending` task.
    pub fn create(&mut self, request: &CreateTaskRequest) -> Result<Task> {
        validate_create(request)?;
        let task = request
            .build(TaskId::new(), &self.tenant, self.now())
            .ok_or_else(|| OpsError::field("taskType", "Task type is required"))?;
        Arc::make_mut(&mut self.tasks).push(task.clone());
        info!(task_id = %task.id, family = %task.family(), "Created task");
        Ok(task)
    }

    /// Assign to a staff member.
    pub fn assign(&mut self, task_id: TaskId, staff_id: StaffId) -> Result<Task> {
        self.apply(task_id, TaskOperation::Assign { staff_id })
    }

    /// Start an assigned task.
    pub fn start(&mut self, task_id: TaskId) -> Result<Task> {
        self.apply(task_id, TaskOperation::Start)
    }

    /// Start a task on behalf of `staff_id`, self-assigning a pending task.
    pub fn start_by(&mut self, task_id: TaskId, staff_id: StaffId) -> Result<Task> {
        self.apply(task_id, TaskOperation::StartBy { staff_id })
    }

    /// Pause a task in progress.
    pub fn hold(&mut self, task_id: TaskId, reason: Option<String>) -> Result<Task> {
        self.apply(task_id, TaskOperation::Hold { reason })
    }

    /// Pause a repair until parts arrive.
    pub fn hold_for_parts(&mut self, task_id: TaskId) -> Result<Task> {
        self.apply(task_id, TaskOperation::HoldForParts)
    }

    /// Continue a paused task.
    pub fn resume(&mut self, task_id: TaskId) -> Result<Task> {
        self.apply(task_id, TaskOperation::Resume)
    }

    /// Complete a task with its report.
    pub fn complete(&mut self, task_id: TaskId, report: hotelops_core::CompletionReport) -> Result<Task> {
        self.apply(task_id, TaskOperation::Complete(report))
    }

    /// Cancel a task. Cancelling a cancelled task changes nothing.
    pub fn cancel(&mut self, task_id: TaskId, reason: Option<String>) -> Result<Task> {
        self.apply(task_id, TaskOperation::Cancel { reason })
    }

    /// Remove a task in any state.
    pub fn delete(&mut self, task_id: TaskId) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| OpsError::NotFound(format!("task {task_id}")))?;
        let removed = Arc::make_mut(&mut self.tasks).remove(index);
        info!(%task_id, "Deleted task");
        Ok(removed)
    }

    /// Plan and commit `op`.
    pub fn apply(&mut self, task_id: TaskId, op: TaskOperation) -> Result<Task> {
        let next = self.plan(task_id, &op)?;
        self.commit(next)
    }

    /// Compute the record `op` would produce, without changing the store.
    pub fn plan(&self, task_id: TaskId, op: &TaskOperation) -> Result<Task> {
        let current = self.require(task_id)?;
        match TransitionValidator::validate(current, op) {
            Transition::Allowed => {}
            Transition::NoOp => return Ok(current.clone()),
            Transition::Rejected => {
                return Err(OpsError::InvalidTransition {
                    task_id,
                    from: current.status,
                    operation: op.name(),
                })
            }
        }

        let now = self.now();
        let mut next = current.clone();
        next.status = op.target();

        match op {
            TaskOperation::Assign { staff_id } => {
                self.check_staff(current, *staff_id)?;
                next.assigned_staff_id = Some(*staff_id);
            }
            TaskOperation::Start | TaskOperation::Resume => {
                next.start_time.get_or_insert(now);
            }
            TaskOperation::StartBy { staff_id } => {
                match current.assigned_staff_id {
                    None => self.check_staff(current, *staff_id)?,
                    Some(assignee) if assignee != *staff_id => {
                        return Err(OpsError::StaffUnavailable {
                            staff_id: *staff_id,
                            reason: format!("task is assigned to staff {assignee}"),
                        })
                    }
                    Some(_) => {}
                }
                next.assigned_staff_id = Some(*staff_id);
                next.start_time.get_or_insert(now);
            }
            TaskOperation::Hold { reason } | TaskOperation::Cancel { reason } => {
                if let Some(reason) = reason {
                    next.append_note(reason);
                }
            }
            TaskOperation::HoldForParts => {}
            TaskOperation::Complete(report) => {
                validate_completion(current.family(), report)?;
                next.completion_time = Some(current.start_time.map_or(now, |started| started.max(now)));
                next.actual_duration = report.actual_duration;
                next.actual_cost = report.actual_cost;
                next.parts_used = report
                    .parts_used
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string);
                next.rating = report.rating;
                if let Some(notes) = &report.notes {
                    next.append_note(notes);
                }
            }
        }

        next.touch(now);
        debug_assert!(next.satisfies_invariants(), "{:?}", next.invariant_violations());
        Ok(next)
    }

    /// Swap in a planned record. The task must still exist.
    pub fn commit(&mut self, task: Task) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == task.id)
            .ok_or_else(|| OpsError::NotFound(format!("task {}", task.id)))?;
        debug!(task_id = %task.id, status = ?task.status, "Committed task");
        Arc::make_mut(&mut self.tasks)[index] = task.clone();
        Ok(task)
    }

    // === Bulk ===

    /// Assign every listed task to `staff_id`. All tasks change or none do.
    pub fn bulk_assign(&mut self, task_ids: &[TaskId], staff_id: StaffId) -> Result<Vec<Task>> {
        let planned = self.plan_bulk_assign(task_ids, staff_id)?;
        Ok(self.commit_all(planned))
    }

    /// Move every listed task to `status`. All tasks change or none do.
    pub fn bulk_update_status(
        &mut self,
        task_ids: &[TaskId],
        status: TaskStatus,
        notes: Option<String>,
    ) -> Result<Vec<Task>> {
        let planned = self.plan_bulk_status(task_ids, status, notes)?;
        Ok(self.commit_all(planned))
    }

    /// Plan an assignment of each distinct task, failing on the first task
    /// that cannot take it.
    pub fn plan_bulk_assign(&self, task_ids: &[TaskId], staff_id: StaffId) -> Result<Vec<Task>> {
        let op = TaskOperation::Assign { staff_id };
        distinct(task_ids).map(|id| self.plan(id, &op)).collect()
    }

    /// Plan a move of each distinct task to `status`, failing on the first
    /// task the state machine does not allow there.
    pub fn plan_bulk_status(
        &self,
        task_ids: &[TaskId],
        status: TaskStatus,
        notes: Option<String>,
    ) -> Result<Vec<Task>> {
        distinct(task_ids)
            .map(|id| {
                let current = self.require(id)?;
                let op = TaskOperation::toward(current.status, status, notes.clone()).ok_or(
                    OpsError::InvalidTransition { task_id: id, from: current.status, operation: "update status" },
                )?;
                self.plan(id, &op)
            })
            .collect()
    }

    /// Swap in planned records in one step.
    pub fn commit_all(&mut self, planned: Vec<Task>) -> Vec<Task> {
        let tasks = Arc::make_mut(&mut self.tasks);
        for next in &planned {
            if let Some(slot) = tasks.iter_mut().find(|t| t.id == next.id) {
                *slot = next.clone();
            }
        }
        debug!(count = planned.len(), "Committed tasks");
        planned
    }

    fn check_staff(&self, task: &Task, staff_id: StaffId) -> Result<()> {
        let staff = self
            .find_staff(staff_id)
            .ok_or_else(|| OpsError::NotFound(format!("staff {staff_id}")))?;
        let unavailable = |reason: String| OpsError::StaffUnavailable { staff_id, reason };

        if !staff.is_active {
            return Err(unavailable("staff member is inactive".to_string()));
        }
        if staff.family != task.family() {
            return Err(unavailable(format!("staff member does not do {} work", task.family())));
        }
        if !staff.is_qualified_for(task.kind) {
            return Err(unavailable(format!("not qualified for {}", task.kind)));
        }
        Ok(())
    }

    // === Refresh ===

    /// Replace every task of `family`; other families are untouched.
    pub fn replace_family(&mut self, family: TaskFamily, tasks: Vec<Task>) {
        let count = tasks.len();
        let mut next: Vec<Task> = self.tasks.iter().filter(|t| t.family() != family).cloned().collect();
        next.extend(tasks.into_iter().filter(|t| t.family() == family));
        self.tasks = Arc::new(next);
        debug!(%family, count, "Replaced family tasks");
    }

    /// Upsert each task, keeping the position of known ones.
    pub fn merge(&mut self, tasks: Vec<Task>) {
        for task in tasks {
            self.upsert(task);
        }
    }

    /// Insert or replace one task.
    pub fn upsert(&mut self, task: Task) {
        let tasks = Arc::make_mut(&mut self.tasks);
        match tasks.iter().position(|t| t.id == task.id) {
            Some(index) => tasks[index] = task,
            None => tasks.push(task),
        }
    }

    /// Replace the staff of `family`.
    pub fn replace_staff(&mut self, family: TaskFamily, staff: Vec<Staff>) {
        let mut next: Vec<Staff> = self.staff.iter().filter(|s| s.family != family).cloned().collect();
        next.extend(staff.into_iter().filter(|s| s.family == family));
        self.staff = Arc::new(next);
    }

    /// Toggle whether a staff member can take assignments.
    pub fn set_staff_active(&mut self, staff_id: StaffId, active: bool) -> Result<Staff> {
        let index = self
            .staff
            .iter()
            .position(|s| s.id == staff_id)
            .ok_or_else(|| OpsError::NotFound(format!("staff {staff_id}")))?;
        let staff = Arc::make_mut(&mut self.staff);
        let mut next = staff[index].clone();
        next.is_active = active;
        staff[index] = next.clone();
        info!(%staff_id, active, "Changed staff availability");
        Ok(next)
    }

    /// Start a refresh of `family`, superseding any earlier one.
    pub fn begin_refresh(&mut self, family: TaskFamily) -> RefreshTicket {
        let generation = &mut self.generations[slot(family)];
        *generation += 1;
        RefreshTicket { family, generation: *generation }
    }

    /// Abandon any outstanding refresh of `family`.
    pub fn cancel_refresh(&mut self, family: TaskFamily) {
        self.generations[slot(family)] += 1;
    }

    /// Whether `ticket` is the latest refresh of its family.
    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.generations[slot(ticket.family)] == ticket.generation
    }

    /// Apply a refresh result if its ticket is still current. Returns whether
    /// it was applied.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, tasks: Vec<Task>) -> bool {
        if !self.is_current(ticket) {
            debug!(family = %ticket.family, "Discarded stale refresh");
            return false;
        }
        self.replace_family(ticket.family, tasks);
        true
    }

    // === Queries ===

    /// Open tasks past their due date.
    pub fn overdue_tasks(&self) -> Vec<&Task> {
        let now = self.now();
        self.tasks.iter().filter(|t| t.is_overdue(now)).collect()
    }

    /// Pending tasks of `family`.
    pub fn unassigned_tasks(&self, family: TaskFamily) -> Vec<&Task> {
        self.family_tasks(family)
            .filter(|t| t.status == TaskStatus::Pending)
            .collect()
    }

    /// Pending tasks of `family` at high priority or above.
    pub fn high_priority_pending(&self, family: TaskFamily) -> Vec<&Task> {
        self.family_tasks(family)
            .filter(|t| t.status == TaskStatus::Pending && t.priority >= Priority::High)
            .collect()
    }

    /// Tasks assigned to a staff member.
    pub fn tasks_for_staff(&self, staff_id: StaffId) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.assigned_staff_id == Some(staff_id))
            .collect()
    }

    /// Open tasks assigned to a staff member.
    pub fn workload(&self, staff_id: StaffId) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.assigned_staff_id == Some(staff_id) && !t.is_terminal())
            .count()
    }

    /// Active staff of `family` with fewer than `max_workload` open tasks.
    pub fn available_staff(&self, family: TaskFamily, max_workload: usize) -> Vec<&Staff> {
        self.staff
            .iter()
            .filter(|s| s.family == family && s.is_active && self.workload(s.id) < max_workload)
            .collect()
    }

    /// Assign to the qualified, available staff member with the lightest
    /// workload. Ties go to the earlier roster entry.
    pub fn auto_assign(&mut self, task_id: TaskId, max_workload: usize) -> Result<Task> {
        let staff_id = self.pick_assignee(task_id, max_workload)?;
        self.assign(task_id, staff_id)
    }

    /// Staff member [`TaskStore::auto_assign`] would choose.
    pub fn pick_assignee(&self, task_id: TaskId, max_workload: usize) -> Result<StaffId> {
        let task = self.require(task_id)?;
        self.available_staff(task.family(), max_workload)
            .into_iter()
            .filter(|s| s.is_qualified_for(task.kind))
            .min_by_key(|s| self.workload(s.id))
            .map(|s| s.id)
            .ok_or(OpsError::NoStaffAvailable { task_id, family: task.family() })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hotelops_core::{CompletionReport, FixedClock, RepairType, ServicingType, TaskKind};
    use hotelops_stats::staff_performance;
    use hotelops_view::{urgency, Urgency};

    pub(crate) fn start_of_day() -> Time {
        Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap()
    }

    pub(crate) fn staff_member(id: u64, family: TaskFamily, specializations: Vec<TaskKind>) -> Staff {
        Staff {
            id: StaffId(id),
            user_id: id * 10,
            name: format!("Staff {id}"),
            family,
            specializations,
            is_active: true,
            average_rating: 0.0,
            total_tasks_completed: 0,
            tenant_id: TenantId::new("hotel-1"),
        }
    }

    pub(crate) fn roster() -> Vec<Staff> {
        vec![
            staff_member(7, TaskFamily::Servicing, vec![]),
            staff_member(8, TaskFamily::Servicing, vec![TaskKind::Servicing(ServicingType::Laundry)]),
            staff_member(20, TaskFamily::Repair, vec![TaskKind::Repair(RepairType::Plumbing)]),
        ]
    }

    pub(crate) fn cleaning_request(priority: Priority, due: Time) -> CreateTaskRequest {
        CreateTaskRequest {
            kind: Some(TaskKind::Servicing(ServicingType::RoomCleaning)),
            priority: Some(priority),
            due_date: Some(due),
            room_number: Some("204".to_string()),
            floor_number: Some(2),
            ..CreateTaskRequest::new(TaskFamily::Servicing, "Clean room 204")
        }
    }

    pub(crate) fn plumbing_request() -> CreateTaskRequest {
        CreateTaskRequest {
            kind: Some(TaskKind::Repair(RepairType::Plumbing)),
            priority: Some(Priority::High),
            due_date: Some(start_of_day() + Duration::hours(4)),
            estimated_cost: Some(60.0),
            ..CreateTaskRequest::new(TaskFamily::Repair, "Blocked drain")
        }
    }

    fn store() -> (TaskStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(start_of_day()));
        let store = TaskStore::new(TenantId::new("hotel-1"), clock.clone()).with_records(vec![], roster());
        (store, clock)
    }

    #[test]
    fn test_overdue_urgent_task_lifecycle() {
        let (mut store, clock) = store();
        let yesterday = start_of_day() - Duration::days(1);
        let task = store.create(&cleaning_request(Priority::Urgent, yesterday)).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, task.updated_at);

        store.assign(task.id, StaffId(7)).unwrap();
        clock.advance(Duration::minutes(5));
        let started = store.start(task.id).unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);
        assert_eq!(urgency(&started, store.now()), Urgency::Critical);

        clock.advance(Duration::minutes(40));
        let report = CompletionReport { actual_duration: Some(40), rating: Some(5), ..Default::default() };
        let done = store.complete(task.id, report).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.completion_time, Some(store.now()));
        assert!(done.satisfies_invariants());

        let perf = staff_performance(store.staff(), store.tasks());
        let almaz = perf.iter().find(|p| p.staff_id == StaffId(7)).unwrap();
        assert_eq!(almaz.tasks_completed, 1);
        assert_eq!(almaz.average_rating, 5.0);
    }

    #[test]
    fn test_assign_on_completed_task_is_rejected_and_unchanged() {
        let (mut store, _) = store();
        let task = store.create(&cleaning_request(Priority::Normal, start_of_day())).unwrap();
        store.start_by(task.id, StaffId(7)).unwrap();
        let done = store.complete(task.id, CompletionReport::default()).unwrap();

        let before = store.snapshot();
        let err = store.assign(task.id, StaffId(8)).unwrap_err();
        assert_eq!(
            err,
            OpsError::InvalidTransition { task_id: task.id, from: TaskStatus::Completed, operation: "assign" }
        );
        assert_eq!(store.get(task.id), Some(&done));
        assert_eq!(*before, *store.snapshot());
    }

    #[test]
    fn test_create_validation_failure_leaves_store_empty() {
        let (mut store, _) = store();
        let err = store.create(&CreateTaskRequest::new(TaskFamily::Servicing, "")).unwrap_err();
        assert!(matches!(err, OpsError::Validation(ref e) if e.contains_key("title")));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_assignment_checks_staff() {
        let (mut store, _) = store();
        let task = store.create(&cleaning_request(Priority::Normal, start_of_day())).unwrap();

        assert!(matches!(store.assign(task.id, StaffId(99)), Err(OpsError::NotFound(_))));
        assert!(matches!(store.assign(task.id, StaffId(20)), Err(OpsError::StaffUnavailable { .. })));
        assert!(matches!(store.assign(task.id, StaffId(8)), Err(OpsError::StaffUnavailable { .. })));

        store.set_staff_active(StaffId(7), false).unwrap();
        assert!(matches!(store.assign(task.id, StaffId(7)), Err(OpsError::StaffUnavailable { .. })));
        assert_eq!(store.get(task.id).unwrap().status, TaskStatus::Pending);

        store.set_staff_active(StaffId(7), true).unwrap();
        let assigned = store.assign(task.id, StaffId(7)).unwrap();
        assert_eq!(assigned.assigned_staff_id, Some(StaffId(7)));
    }

    #[test]
    fn test_start_by_someone_else_is_rejected() {
        let (mut store, _) = store();
        let task = store.create(&cleaning_request(Priority::Normal, start_of_day())).unwrap();
        store.assign(task.id, StaffId(7)).unwrap();
        let err = store.start_by(task.id, StaffId(8)).unwrap_err();
        assert!(matches!(err, OpsError::StaffUnavailable { .. }));
    }

    #[test]
    fn test_repair_parts_wait_and_completion() {
        let (mut store, clock) = store();
        let task = store.create(&plumbing_request()).unwrap();
        store.start_by(task.id, StaffId(20)).unwrap();
        store.hold_for_parts(task.id).unwrap();
        clock.advance(Duration::hours(2));

        let report = CompletionReport {
            actual_duration: Some(150),
            actual_cost: Some(85.0),
            parts_used: Some("P-trap".to_string()),
            rating: Some(4),
            notes: Some("Replaced trap".to_string()),
        };
        let done = store.complete(task.id, report).unwrap();
        assert_eq!(done.actual_cost, Some(85.0));
        assert_eq!(done.parts_used.as_deref(), Some("P-trap"));
        assert_eq!(done.notes.as_deref(), Some("Replaced trap"));
    }

    #[test]
    fn test_hold_resume_keeps_start_time() {
        let (mut store, clock) = store();
        let task = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        let started = store.start_by(task.id, StaffId(7)).unwrap();
        store.hold(task.id, Some("guest in room".to_string())).unwrap();
        clock.advance(Duration::minutes(30));
        let resumed = store.resume(task.id).unwrap();
        assert_eq!(resumed.start_time, started.start_time);
        assert_eq!(resumed.notes.as_deref(), Some("guest in room"));
        assert!(matches!(store.hold_for_parts(task.id), Err(OpsError::InvalidTransition { .. })));
    }

    #[test]
    fn test_cancel_is_idempotent_but_not_after_completion() {
        let (mut store, clock) = store();
        let task = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        let cancelled = store.cancel(task.id, Some("room out of order".to_string())).unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);
        clock.advance(Duration::minutes(1));
        assert_eq!(store.cancel(task.id, Some("again".to_string())).unwrap(), cancelled);

        let other = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        store.start_by(other.id, StaffId(7)).unwrap();
        store.complete(other.id, CompletionReport::default()).unwrap();
        assert!(matches!(store.cancel(other.id, None), Err(OpsError::InvalidTransition { .. })));
    }

    #[test]
    fn test_invalid_completion_report_changes_nothing() {
        let (mut store, _) = store();
        let task = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        let started = store.start_by(task.id, StaffId(7)).unwrap();
        let report = CompletionReport { rating: Some(9), ..Default::default() };
        assert!(matches!(store.complete(task.id, report), Err(OpsError::Validation(_))));
        assert_eq!(store.get(task.id), Some(&started));
    }

    #[test]
    fn test_delete_in_any_state() {
        let (mut store, _) = store();
        let task = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        store.start_by(task.id, StaffId(7)).unwrap();
        store.delete(task.id).unwrap();
        assert!(store.get(task.id).is_none());
        assert!(matches!(store.delete(task.id), Err(OpsError::NotFound(_))));
    }

    #[test]
    fn test_bulk_assign_is_all_or_nothing() {
        let (mut store, _) = store();
        let first = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        let busy = store.create(&cleaning_request(Priority::High, start_of_day())).unwrap();
        store.start_by(busy.id, StaffId(7)).unwrap();
        let before = store.snapshot();

        let err = store.bulk_assign(&[first.id, busy.id], StaffId(7)).unwrap_err();
        assert_eq!(
            err,
            OpsError::InvalidTransition { task_id: busy.id, from: TaskStatus::InProgress, operation: "assign" }
        );
        let err = store.bulk_assign(&[first.id, TaskId::new()], StaffId(7)).unwrap_err();
        assert!(matches!(err, OpsError::NotFound(_)));
        assert_eq!(*before, *store.snapshot());
        assert_eq!(store.get(first.id).unwrap().status, TaskStatus::Pending);

        let second = store.create(&cleaning_request(Priority::Normal, start_of_day())).unwrap();
        let assigned = store.bulk_assign(&[first.id, second.id, first.id], StaffId(7)).unwrap();
        assert_eq!(assigned.len(), 2);
        assert!(assigned.iter().all(|t| t.status == TaskStatus::Assigned));
        assert_eq!(store.tasks_for_staff(StaffId(7)).len(), 3);
    }

    #[test]
    fn test_bulk_status_starts_or_resumes_each_task() {
        let (mut store, clock) = store();
        let fresh = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        store.assign(fresh.id, StaffId(7)).unwrap();
        let paused = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        store.start_by(paused.id, StaffId(7)).unwrap();
        store.hold(paused.id, None).unwrap();

        clock.advance(Duration::minutes(10));
        let started = store.bulk_update_status(&[fresh.id, paused.id], TaskStatus::InProgress, None).unwrap();
        assert!(started.iter().all(|t| t.status == TaskStatus::InProgress));
        assert_eq!(started[0].start_time, Some(store.now()));
        assert_eq!(started[1].start_time, Some(start_of_day()));

        let done = store
            .bulk_update_status(&[fresh.id, paused.id], TaskStatus::Completed, Some("Floor 2 done".to_string()))
            .unwrap();
        assert!(done.iter().all(|t| t.status == TaskStatus::Completed && t.satisfies_invariants()));
        assert!(done.iter().all(|t| t.notes.as_deref() == Some("Floor 2 done")));
    }

    #[test]
    fn test_bulk_status_rejects_unreachable_targets() {
        let (mut store, _) = store();
        let pending = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        let before = store.snapshot();

        let err = store.bulk_update_status(&[pending.id], TaskStatus::InProgress, None).unwrap_err();
        assert_eq!(
            err,
            OpsError::InvalidTransition { task_id: pending.id, from: TaskStatus::Pending, operation: "start" }
        );
        let err = store.bulk_update_status(&[pending.id], TaskStatus::Assigned, None).unwrap_err();
        assert_eq!(
            err,
            OpsError::InvalidTransition { task_id: pending.id, from: TaskStatus::Pending, operation: "update status" }
        );
        assert_eq!(*before, *store.snapshot());
    }

    #[test]
    fn test_old_snapshots_are_not_affected_by_mutations() {
        let (mut store, _) = store();
        let task = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        let before = store.snapshot();
        store.assign(task.id, StaffId(7)).unwrap();
        assert_eq!(before[0].status, TaskStatus::Pending);
        assert_eq!(store.tasks()[0].status, TaskStatus::Assigned);
    }

    #[test]
    fn test_superseded_refresh_is_discarded() {
        let (mut store, _) = store();
        let existing = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();

        let stale = store.begin_refresh(TaskFamily::Servicing);
        let fresh = store.begin_refresh(TaskFamily::Servicing);
        assert!(!store.apply_refresh(stale, vec![]));
        assert_eq!(store.tasks().len(), 1);

        store.cancel_refresh(TaskFamily::Servicing);
        assert!(!store.apply_refresh(fresh, vec![]));

        let current = store.begin_refresh(TaskFamily::Servicing);
        assert!(store.apply_refresh(current, vec![]));
        assert!(store.get(existing.id).is_none());
    }

    #[test]
    fn test_replace_family_keeps_other_family() {
        let (mut store, _) = store();
        let cleaning = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        let repair = store.create(&plumbing_request()).unwrap();
        store.replace_family(TaskFamily::Repair, vec![]);
        assert!(store.get(cleaning.id).is_some());
        assert!(store.get(repair.id).is_none());
    }

    #[test]
    fn test_merge_upserts_in_place() {
        let (mut store, _) = store();
        let first = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        let second = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();

        let mut changed = first.clone();
        changed.title = "Clean room 204 again".to_string();
        let mut brand_new = second.clone();
        brand_new.id = TaskId::new();
        store.merge(vec![changed.clone(), brand_new.clone()]);

        let ids: Vec<_> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, second.id, brand_new.id]);
        assert_eq!(store.get(first.id), Some(&changed));
    }

    #[test]
    fn test_queries() {
        let (mut store, _) = store();
        let late = store.create(&cleaning_request(Priority::High, start_of_day() - Duration::hours(1))).unwrap();
        let later = store.create(&cleaning_request(Priority::Low, start_of_day() + Duration::hours(1))).unwrap();
        store.assign(later.id, StaffId(7)).unwrap();

        assert_eq!(store.overdue_tasks().iter().map(|t| t.id).collect::<Vec<_>>(), vec![late.id]);
        assert_eq!(store.unassigned_tasks(TaskFamily::Servicing).len(), 1);
        assert_eq!(store.high_priority_pending(TaskFamily::Servicing)[0].id, late.id);
        assert_eq!(store.tasks_for_staff(StaffId(7))[0].id, later.id);
        assert_eq!(store.workload(StaffId(7)), 1);
    }

    #[test]
    fn test_auto_assign_prefers_lightest_qualified_workload() {
        let (mut store, _) = store();
        let busy = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        store.assign(busy.id, StaffId(7)).unwrap();

        let laundry = CreateTaskRequest {
            kind: Some(TaskKind::Servicing(ServicingType::Laundry)),
            ..cleaning_request(Priority::Normal, start_of_day())
        };
        let task = store.create(&laundry).unwrap();
        let assigned = store.auto_assign(task.id, 8).unwrap();
        assert_eq!(assigned.assigned_staff_id, Some(StaffId(8)));

        // Cleaning needs a generalist: staff 8 only does laundry.
        let cleaning = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        assert_eq!(store.auto_assign(cleaning.id, 8).unwrap().assigned_staff_id, Some(StaffId(7)));

        let another = store.create(&cleaning_request(Priority::Low, start_of_day())).unwrap();
        assert_eq!(
            store.auto_assign(another.id, 2).unwrap_err(),
            OpsError::NoStaffAvailable { task_id: another.id, family: TaskFamily::Servicing }
        );
    }

    #[test]
    fn test_every_reachable_state_satisfies_invariants() {
        let (mut store, _) = store();
        let ops = |staff| {
            vec![
                TaskOperation::Assign { staff_id: staff },
                TaskOperation::Start,
                TaskOperation::HoldForParts,
                TaskOperation::Resume,
                TaskOperation::Hold { reason: Some("break".to_string()) },
                TaskOperation::Resume,
                TaskOperation::Complete(CompletionReport { actual_duration: Some(10), ..Default::default() }),
                TaskOperation::Cancel { reason: None },
            ]
        };
        for (request, staff) in [(plumbing_request(), StaffId(20)), (cleaning_request(Priority::Low, start_of_day()), StaffId(7))] {
            let task = store.create(&request).unwrap();
            for op in ops(staff) {
                let before = store.get(task.id).cloned().unwrap();
                match store.apply(task.id, op) {
                    Ok(after) => {
                        assert!(after.satisfies_invariants(), "{:?}", after.invariant_violations());
                        assert!(
                            after == before
                                || TransitionValidator::is_edge(after.family(), before.status, after.status)
                        );
                    }
                    Err(_) => assert_eq!(store.get(task.id), Some(&before)),
                }
            }
        }
    }
}
