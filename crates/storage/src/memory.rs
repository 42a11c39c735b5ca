//! In-memory backend.
//!
//! Behaves like the remote operations API for one tenant: allocates ids,
//! stamps timestamps, pages listings and computes dashboard figures. Used by
//! the CLI (seeded from a [`Snapshot`]) and by tests, which can make the next
//! call fail with [`InMemoryBackend::fail_next`] or a later one with
//! [`InMemoryBackend::fail_after`]. Bulk calls validate every task before
//! changing any.

use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::Mutex;
use hotelops_core::{
    Clock, CreateTaskRequest, Staff, StaffFilter, StaffId, StatusUpdate, Task, TaskFamily,
    TaskFilter, TaskId, TaskStatus, TenantId, Time,
};
use hotelops_stats::{
    operations_stats, recent_activity, staff_performance, OperationsStats, RecentActivity,
    StaffPerformance,
};
use hotelops_view::{apply_filters, paginate};
use crate::decode::DecodeError;
use crate::snapshot::Snapshot;
use crate::trait_::{BackendError, OperationsBackend, PageResponse, Result};

#[derive(Debug, Default)]
struct State {
    tasks: Vec<Task>,
    staff: Vec<Staff>,
    failure: Option<(usize, String)>,
}

/// Backend keeping everything in process memory.
pub struct InMemoryBackend {
    tenant: TenantId,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl InMemoryBackend {
    /// Empty backend for `tenant`.
    pub fn new(tenant: TenantId, clock: Arc<dyn Clock>) -> Self {
        Self {
            tenant,
            clock,
            state: Mutex::new(State::default()),
        }
    }

    /// Builder: preload records.
    pub fn with_records(self, tasks: Vec<Task>, staff: Vec<Staff>) -> Self {
        Self {
            state: Mutex::new(State { tasks, staff, failure: None }),
            ..self
        }
    }

    /// Backend seeded from a snapshot.
    pub fn from_snapshot(snapshot: &Snapshot, clock: Arc<dyn Clock>) -> std::result::Result<Self, DecodeError> {
        let (tasks, staff) = snapshot.decode()?;
        Ok(Self::new(TenantId::new(snapshot.tenant_id.clone()), clock).with_records(tasks, staff))
    }

    /// Current contents as a snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;
        Snapshot::from_entities(&self.tenant, &state.tasks, &state.staff)
    }

    /// Make the next call fail with a transport error carrying `message`.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.fail_after(0, message).await;
    }

    /// Let `calls` more calls succeed, then fail one with `message`.
    pub async fn fail_after(&self, calls: usize, message: impl Into<String>) {
        self.state.lock().await.failure = Some((calls, message.into()));
    }

    /// Every stored task.
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    async fn lock(&self) -> Result<tokio::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().await;
        match state.failure.take() {
            Some((0, message)) => {
                tracing::warn!(%message, "Injected backend failure");
                return Err(BackendError::Transport(message));
            }
            Some((calls, message)) => state.failure = Some((calls - 1, message)),
            None => {}
        }
        Ok(state)
    }
}

fn find(state: &State, family: TaskFamily, task_id: TaskId) -> Result<&Task> {
    state
        .tasks
        .iter()
        .find(|t| t.id == task_id && t.family() == family)
        .ok_or_else(|| BackendError::NotFound(format!("{} task {}", family, task_id)))
}

fn store_all(state: &mut State, updated: &[Task]) {
    for next in updated {
        if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == next.id) {
            *slot = next.clone();
        }
    }
}

fn check_staff(state: &State, family: TaskFamily, staff_id: StaffId) -> Result<()> {
    if state.staff.iter().any(|s| s.id == staff_id && s.family == family) {
        Ok(())
    } else {
        Err(BackendError::NotFound(format!("staff {}", staff_id)))
    }
}

fn with_status(task: &Task, family: TaskFamily, update: &StatusUpdate, now: Time) -> Result<Task> {
    if task.is_terminal() && task.status != update.status {
        return Err(BackendError::Transport(format!("Task is already {}", task.status)));
    }
    if !update.status.applies_to(family) {
        return Err(BackendError::Transport(format!("{} is not a {} status", update.status, family)));
    }
    if update.status == TaskStatus::InProgress && task.assigned_staff_id.is_none() {
        return Err(BackendError::Transport("Task must be assigned before starting".to_string()));
    }

    let mut next = task.clone();
    next.status = update.status;
    match update.status {
        TaskStatus::InProgress if next.start_time.is_none() => next.start_time = Some(now),
        TaskStatus::Completed => {
            let done = next.start_time.map_or(now, |started| started.max(now));
            next.completion_time = Some(done);
            next.actual_duration = update.actual_duration;
            next.actual_cost = update.actual_cost;
            next.parts_used = update.parts_used.clone();
            next.rating = update.rating;
        }
        _ => {}
    }
    if let Some(notes) = &update.notes {
        next.append_note(notes);
    }
    next.touch(now);
    Ok(next)
}

fn with_assignee(task: &Task, staff_id: StaffId, notes: Option<&str>, now: Time) -> Result<Task> {
    if !matches!(task.status, TaskStatus::Pending | TaskStatus::Assigned) {
        return Err(BackendError::Transport(format!("Cannot assign a task that is {}", task.status)));
    }
    let mut next = task.clone();
    next.status = TaskStatus::Assigned;
    next.assigned_staff_id = Some(staff_id);
    if let Some(notes) = notes {
        next.append_note(notes);
    }
    next.touch(now);
    Ok(next)
}

#[async_trait]
impl OperationsBackend for InMemoryBackend {
    async fn list_tasks(
        &self,
        family: TaskFamily,
        page: usize,
        page_size: usize,
        filter: &TaskFilter,
    ) -> Result<PageResponse<Task>> {
        let state = self.lock().await?;
        let matching: Vec<Task> = apply_filters(state.tasks.iter().filter(|t| t.family() == family), filter)
            .into_iter()
            .cloned()
            .collect();
        Ok(paginate(&matching, page, page_size).into())
    }

    async fn create_task(&self, family: TaskFamily, request: &CreateTaskRequest) -> Result<Task> {
        let mut state = self.lock().await?;
        if request.family != family {
            return Err(BackendError::Transport(format!(
                "{} request sent to {} endpoint",
                request.family, family
            )));
        }
        let task = request
            .build(TaskId::new(), &self.tenant, self.clock.now())
            .ok_or_else(|| BackendError::Transport("Task type, priority and due date are required".to_string()))?;
        tracing::debug!(task_id = %task.id, %family, "Backend created task");
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_status(
        &self,
        family: TaskFamily,
        task_id: TaskId,
        update: &StatusUpdate,
    ) -> Result<Task> {
        let now = self.clock.now();
        let mut state = self.lock().await?;
        let next = with_status(find(&state, family, task_id)?, family, update, now)?;
        store_all(&mut state, std::slice::from_ref(&next));
        tracing::debug!(%task_id, status = ?update.status, "Backend updated status");
        Ok(next)
    }

    async fn assign_task(
        &self,
        family: TaskFamily,
        task_id: TaskId,
        staff_id: StaffId,
        notes: Option<String>,
    ) -> Result<Task> {
        let now = self.clock.now();
        let mut state = self.lock().await?;
        check_staff(&state, family, staff_id)?;
        let next = with_assignee(find(&state, family, task_id)?, staff_id, notes.as_deref(), now)?;
        store_all(&mut state, std::slice::from_ref(&next));
        tracing::debug!(%task_id, %staff_id, "Backend assigned task");
        Ok(next)
    }

    async fn bulk_assign(
        &self,
        family: TaskFamily,
        task_ids: &[TaskId],
        staff_id: StaffId,
        notes: Option<String>,
    ) -> Result<Vec<Task>> {
        let now = self.clock.now();
        let mut state = self.lock().await?;
        check_staff(&state, family, staff_id)?;
        let updated = task_ids
            .iter()
            .map(|id| with_assignee(find(&state, family, *id)?, staff_id, notes.as_deref(), now))
            .collect::<Result<Vec<_>>>()?;
        store_all(&mut state, &updated);
        tracing::debug!(%family, %staff_id, count = updated.len(), "Backend bulk-assigned tasks");
        Ok(updated)
    }

    async fn bulk_update_status(
        &self,
        family: TaskFamily,
        task_ids: &[TaskId],
        update: &StatusUpdate,
    ) -> Result<Vec<Task>> {
        let now = self.clock.now();
        let mut state = self.lock().await?;
        let updated = task_ids
            .iter()
            .map(|id| with_status(find(&state, family, *id)?, family, update, now))
            .collect::<Result<Vec<_>>>()?;
        store_all(&mut state, &updated);
        tracing::debug!(%family, status = ?update.status, count = updated.len(), "Backend bulk-updated status");
        Ok(updated)
    }

    async fn delete_task(&self, family: TaskFamily, task_id: TaskId) -> Result<()> {
        let mut state = self.lock().await?;
        let before = state.tasks.len();
        state.tasks.retain(|t| !(t.id == task_id && t.family() == family));
        if state.tasks.len() == before {
            return Err(BackendError::NotFound(format!("{} task {}", family, task_id)));
        }
        Ok(())
    }

    async fn list_staff(&self, family: TaskFamily, filter: &StaffFilter) -> Result<Vec<Staff>> {
        let state = self.lock().await?;
        Ok(state
            .staff
            .iter()
            .filter(|s| s.family == family && filter.matches(s))
            .cloned()
            .collect())
    }

    async fn get_stats(&self) -> Result<OperationsStats> {
        let state = self.lock().await?;
        Ok(operations_stats(&state.tasks))
    }

    async fn get_staff_performance(&self) -> Result<Vec<StaffPerformance>> {
        let state = self.lock().await?;
        Ok(staff_performance(&state.staff, &state.tasks))
    }

    async fn get_recent_activity(&self, limit: usize) -> Result<Vec<RecentActivity>> {
        let state = self.lock().await?;
        Ok(recent_activity(&state.tasks, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hotelops_core::{CompletionReport, FixedClock, Priority, ServicingType, TaskKind};

    fn backend() -> (InMemoryBackend, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()));
        let tenant = TenantId::new("hotel-1");
        let staff = Staff {
            id: StaffId(7),
            user_id: 70,
            name: "Almaz T.".to_string(),
            family: TaskFamily::Servicing,
            specializations: vec![],
            is_active: true,
            average_rating: 0.0,
            total_tasks_completed: 0,
            tenant_id: tenant.clone(),
        };
        let backend = InMemoryBackend::new(tenant, clock.clone()).with_records(vec![], vec![staff]);
        (backend, clock)
    }

    fn request() -> CreateTaskRequest {
        CreateTaskRequest {
            kind: Some(TaskKind::Servicing(ServicingType::DeepCleaning)),
            priority: Some(Priority::High),
            due_date: Some(Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap()),
            room_number: Some("305".to_string()),
            ..CreateTaskRequest::new(TaskFamily::Servicing, "Deep clean 305")
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle_through_backend() {
        let (backend, clock) = backend();
        let family = TaskFamily::Servicing;
        let task = backend.create_task(family, &request()).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        let task = backend.assign_task(family, task.id, StaffId(7), None).await.unwrap();
        assert_eq!(task.assigned_staff_id, Some(StaffId(7)));

        clock.advance(Duration::minutes(5));
        let task = backend
            .update_status(family, task.id, &StatusUpdate::to(TaskStatus::InProgress))
            .await
            .unwrap();
        assert!(task.start_time.is_some());

        clock.advance(Duration::minutes(40));
        let report = CompletionReport { actual_duration: Some(40), rating: Some(5), ..Default::default() };
        let task = backend
            .update_status(family, task.id, &StatusUpdate::completed(&report))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.satisfies_invariants());

        let perf = backend.get_staff_performance().await.unwrap();
        assert_eq!(perf[0].tasks_completed, 1);
        assert_eq!(perf[0].average_rating, 5.0);
        assert_eq!(backend.get_stats().await.unwrap().servicing.completion_rate, 100);
    }

    #[tokio::test]
    async fn test_injected_failure_hits_only_the_next_call() {
        let (backend, _) = backend();
        backend.fail_next("HTTP error! status: 500").await;
        let err = backend.create_task(TaskFamily::Servicing, &request()).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 500");
        assert!(backend.tasks().await.is_empty());

        assert!(backend.create_task(TaskFamily::Servicing, &request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_tasks_filters_and_pages() {
        let (backend, _) = backend();
        for _ in 0..5 {
            backend.create_task(TaskFamily::Servicing, &request()).await.unwrap();
        }
        let page = backend
            .list_tasks(TaskFamily::Servicing, 1, 2, &TaskFilter::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);

        let repair = backend
            .list_tasks(TaskFamily::Repair, 0, 20, &TaskFilter::default())
            .await
            .unwrap();
        assert!(repair.items.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (backend, _) = backend();
        let err = backend.delete_task(TaskFamily::Servicing, TaskId::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));

        let task = backend.create_task(TaskFamily::Servicing, &request()).await.unwrap();
        let err = backend
            .assign_task(TaskFamily::Servicing, task.id, StaffId(99), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fail_after_skips_earlier_calls() {
        let (backend, _) = backend();
        backend.fail_after(1, "HTTP error! status: 502").await;
        let task = backend.create_task(TaskFamily::Servicing, &request()).await.unwrap();
        let err = backend
            .assign_task(TaskFamily::Servicing, task.id, StaffId(7), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 502");
        assert_eq!(backend.tasks().await, vec![task]);
    }

    #[tokio::test]
    async fn test_bulk_assign_then_start() {
        let (backend, _) = backend();
        let family = TaskFamily::Servicing;
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(backend.create_task(family, &request()).await.unwrap().id);
        }
        let assigned = backend
            .bulk_assign(family, &ids, StaffId(7), Some("Floor 3 sweep".to_string()))
            .await
            .unwrap();
        assert_eq!(assigned.len(), 3);
        assert!(assigned.iter().all(|t| t.assigned_staff_id == Some(StaffId(7))));
        assert!(assigned.iter().all(|t| t.notes.as_deref() == Some("Floor 3 sweep")));

        let started = backend
            .bulk_update_status(family, &ids, &StatusUpdate::to(TaskStatus::InProgress))
            .await
            .unwrap();
        assert!(started.iter().all(|t| t.status == TaskStatus::InProgress && t.start_time.is_some()));
        assert_eq!(backend.tasks().await, started);
    }

    #[tokio::test]
    async fn test_bulk_call_with_one_bad_task_changes_nothing() {
        let (backend, _) = backend();
        let family = TaskFamily::Servicing;
        let first = backend.create_task(family, &request()).await.unwrap();
        let second = backend.create_task(family, &request()).await.unwrap();
        let before = backend.tasks().await;

        let err = backend
            .bulk_assign(family, &[first.id, TaskId::new(), second.id], StaffId(7), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
        assert_eq!(backend.tasks().await, before);

        backend.assign_task(family, second.id, StaffId(7), None).await.unwrap();
        let before = backend.tasks().await;
        let err = backend
            .bulk_update_status(family, &[second.id, first.id], &StatusUpdate::to(TaskStatus::InProgress))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Task must be assigned before starting");
        assert_eq!(backend.tasks().await, before);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let (backend, clock) = backend();
        backend.create_task(TaskFamily::Servicing, &request()).await.unwrap();
        let snapshot = backend.snapshot().await;
        let copy = InMemoryBackend::from_snapshot(&snapshot, clock).unwrap();
        assert_eq!(copy.tasks().await, backend.tasks().await);
    }
}
