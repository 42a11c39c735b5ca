//! Operations manager.
//!
//! Couples a [`TaskStore`] to an [`OperationsBackend`]. Every action is
//! planned against the store first, so illegal transitions and bad payloads
//! never reach the backend. The record the backend returns is then applied
//! with last-write-wins semantics. A failed backend call leaves the store
//! untouched and is remembered as the last error.

use std::sync::Arc;
use tracing::{debug, info, warn};
use hotelops_core::{
    Clock, CompletionReport, CreateTaskRequest, OpsError, Result, Staff, StaffFilter, StaffId,
    StatusUpdate, Task, TaskFamily, TaskFilter, TaskId, TaskStatus, TenantId,
};
use hotelops_stats::{operations_stats, OperationsStats, RecentActivity, StaffPerformance};
use hotelops_storage::OperationsBackend;
use hotelops_view::{Page, SortOrder, TaskView};
use crate::config::{ConfigError, OperationsConfig};
use crate::rules::validate_create;
use crate::store::{RefreshTicket, TaskStore};
use crate::transition::TaskOperation;

/// One rendered page of a family view.
pub type FamilyPage = Page<Task>;

#[derive(Debug)]
struct FamilyState {
    view: TaskView,
    loading: bool,
    remote_total: Option<usize>,
}

impl FamilyState {
    fn new(family: TaskFamily, config: &OperationsConfig) -> Self {
        Self {
            view: TaskView::new(family)
                .with_page_size(config.page_size)
                .with_sort(config.default_sort),
            loading: false,
            remote_total: None,
        }
    }
}

/// Presentation-facing state of one tenant's operations.
pub struct OperationsManager {
    backend: Arc<dyn OperationsBackend>,
    store: TaskStore,
    config: OperationsConfig,
    servicing: FamilyState,
    repair: FamilyState,
    stats: Option<OperationsStats>,
    performance: Vec<StaffPerformance>,
    activity: Vec<RecentActivity>,
    loading_dashboard: bool,
    last_error: Option<String>,
}

impl OperationsManager {
    /// Manager with an empty store. Nothing is fetched until a load is requested.
    pub fn new(
        backend: Arc<dyn OperationsBackend>,
        clock: Arc<dyn Clock>,
        config: OperationsConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let store = TaskStore::new(TenantId::new(config.tenant_id.clone()), clock);
        Ok(Self {
            backend,
            store,
            servicing: FamilyState::new(TaskFamily::Servicing, &config),
            repair: FamilyState::new(TaskFamily::Repair, &config),
            config,
            stats: None,
            performance: Vec::new(),
            activity: Vec::new(),
            loading_dashboard: false,
            last_error: None,
        })
    }

    fn state(&self, family: TaskFamily) -> &FamilyState {
        match family {
            TaskFamily::Servicing => &self.servicing,
            TaskFamily::Repair => &self.repair,
        }
    }

    fn state_mut(&mut self, family: TaskFamily) -> &mut FamilyState {
        match family {
            TaskFamily::Servicing => &mut self.servicing,
            TaskFamily::Repair => &mut self.repair,
        }
    }

    fn fail(&mut self, err: OpsError) -> OpsError {
        warn!(error = %err, "Operation failed");
        self.last_error = Some(err.to_string());
        err
    }

    // === Read side ===

    /// The task store.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &OperationsConfig {
        &self.config
    }

    /// Current page of `family` under its filter and sort.
    pub fn view(&self, family: TaskFamily) -> FamilyPage {
        self.state(family).view.render(self.store.tasks(), self.store.now())
    }

    /// Every task of `family` passing its filter, in sort order.
    pub fn visible(&self, family: TaskFamily) -> Vec<&Task> {
        self.state(family).view.visible(self.store.tasks(), self.store.now())
    }

    /// View state of `family`.
    pub fn task_view(&self, family: TaskFamily) -> &TaskView {
        &self.state(family).view
    }

    /// Whether a task load of `family` is outstanding.
    pub fn is_loading(&self, family: TaskFamily) -> bool {
        self.state(family).loading
    }

    /// Whether a dashboard load is outstanding.
    pub fn is_loading_dashboard(&self) -> bool {
        self.loading_dashboard
    }

    /// Total the backend reported for `family` at the last load.
    pub fn remote_total(&self, family: TaskFamily) -> Option<usize> {
        self.state(family).remote_total
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Forget the last error.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Dashboard summary from the backend, if loaded.
    pub fn stats(&self) -> Option<&OperationsStats> {
        self.stats.as_ref()
    }

    /// Dashboard summary computed from the loaded tasks.
    pub fn local_stats(&self) -> OperationsStats {
        operations_stats(self.store.tasks())
    }

    /// Staff performance from the backend.
    pub fn staff_performance(&self) -> &[StaffPerformance] {
        &self.performance
    }

    /// Recent activity from the backend.
    pub fn recent_activity(&self) -> &[RecentActivity] {
        &self.activity
    }

    /// Loaded staff of `family`.
    pub fn staff(&self, family: TaskFamily) -> Vec<&Staff> {
        self.store.staff().iter().filter(|s| s.family == family).collect()
    }

    // === View state ===

    /// Replace the filter of `family`; back to the first page.
    pub fn set_filter(&mut self, family: TaskFamily, filter: TaskFilter) {
        self.state_mut(family).view.set_filter(filter);
    }

    /// Edit the filter of `family` in place; back to the first page.
    pub fn update_filter(&mut self, family: TaskFamily, edit: impl FnOnce(&mut TaskFilter)) {
        self.state_mut(family).view.update_filter(edit);
    }

    /// Drop every filter of `family`.
    pub fn clear_filter(&mut self, family: TaskFamily) {
        self.state_mut(family).view.clear_filter();
    }

    /// Change the sort order of `family`.
    pub fn set_sort(&mut self, family: TaskFamily, sort: SortOrder) {
        self.state_mut(family).view.set_sort(sort);
    }

    /// Jump to a page of `family`.
    pub fn set_page(&mut self, family: TaskFamily, page: usize) {
        self.state_mut(family).view.set_page(page);
    }

    /// Change the page size of `family`; back to the first page.
    pub fn set_page_size(&mut self, family: TaskFamily, page_size: usize) {
        self.state_mut(family).view.set_page_size(page_size);
    }

    /// Drop filters, sorts and errors; loaded data stays.
    pub fn reset(&mut self) {
        for family in [TaskFamily::Servicing, TaskFamily::Repair] {
            let sort = self.config.default_sort;
            let view = &mut self.state_mut(family).view;
            view.reset();
            view.set_sort(sort);
        }
        self.last_error = None;
    }

    // === Loading ===

    /// Fetch every page of `family`, unfiltered.
    pub async fn fetch_family(
        backend: &dyn OperationsBackend,
        family: TaskFamily,
        page_size: usize,
    ) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        let mut page = 0;
        loop {
            let response = backend
                .list_tasks(family, page, page_size, &TaskFilter::default())
                .await?;
            tasks.extend(response.items);
            page += 1;
            if page >= response.total_pages {
                break;
            }
        }
        Ok(tasks)
    }

    /// Mark a load of `family` as started. Any earlier load is superseded.
    pub fn begin_load(&mut self, family: TaskFamily) -> RefreshTicket {
        let ticket = self.store.begin_refresh(family);
        self.state_mut(family).loading = true;
        ticket
    }

    /// Apply the outcome of a load. Returns whether the tasks were applied;
    /// a superseded or cancelled load is dropped silently.
    pub fn finish_load(&mut self, ticket: RefreshTicket, outcome: Result<Vec<Task>>) -> Result<bool> {
        let family = ticket.family();
        match outcome {
            Ok(tasks) => {
                let count = tasks.len();
                if !self.store.apply_refresh(ticket, tasks) {
                    return Ok(false);
                }
                let state = self.state_mut(family);
                state.loading = false;
                state.remote_total = Some(count);
                self.last_error = None;
                info!(%family, count, "Loaded tasks");
                Ok(true)
            }
            Err(_) if !self.store.is_current(ticket) => Ok(false),
            Err(err) => {
                debug!(%family, "Load failed; keeping previous tasks");
                self.state_mut(family).loading = false;
                Err(self.fail(err))
            }
        }
    }

    /// Load every task of `family` from the backend.
    pub async fn load_tasks(&mut self, family: TaskFamily) -> Result<()> {
        let ticket = self.begin_load(family);
        let backend = Arc::clone(&self.backend);
        let outcome = Self::fetch_family(backend.as_ref(), family, self.config.page_size).await;
        self.finish_load(ticket, outcome).map(|_| ())
    }

    /// Abandon an outstanding load of `family`.
    pub fn cancel_load(&mut self, family: TaskFamily) {
        self.store.cancel_refresh(family);
        self.state_mut(family).loading = false;
        debug!(%family, "Cancelled load");
    }

    /// Load the staff of `family`.
    pub async fn load_staff(&mut self, family: TaskFamily) -> Result<()> {
        match self.backend.list_staff(family, &StaffFilter::default()).await {
            Ok(staff) => {
                debug!(%family, count = staff.len(), "Loaded staff");
                self.store.replace_staff(family, staff);
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Load the dashboard summary, staff performance and activity feed.
    pub async fn load_dashboard(&mut self) -> Result<()> {
        self.loading_dashboard = true;
        let backend = Arc::clone(&self.backend);
        let limit = self.config.activity_limit;
        let outcome = async {
            let stats = backend.get_stats().await?;
            let performance = backend.get_staff_performance().await?;
            let activity = backend.get_recent_activity(limit).await?;
            Ok::<_, hotelops_storage::BackendError>((stats, performance, activity))
        }
        .await;
        self.loading_dashboard = false;

        match outcome {
            Ok((stats, performance, activity)) => {
                self.stats = Some(stats);
                self.performance = performance;
                self.activity = activity;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Load staff and tasks of both families, then the dashboard.
    pub async fn refresh_all(&mut self) -> Result<()> {
        for family in [TaskFamily::Servicing, TaskFamily::Repair] {
            self.load_staff(family).await?;
            self.load_tasks(family).await?;
        }
        self.load_dashboard().await
    }

    // === Actions ===

    /// Validate and create a task.
    pub async fn create_task(&mut self, request: CreateTaskRequest) -> Result<Task> {
        if let Err(err) = validate_create(&request) {
            return Err(self.fail(err));
        }
        match self.backend.create_task(request.family, &request).await {
            Ok(task) => {
                info!(task_id = %task.id, family = %task.family(), "Created task");
                self.store.upsert(task.clone());
                self.last_error = None;
                Ok(task)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Assign a task.
    pub async fn assign(&mut self, task_id: TaskId, staff_id: StaffId) -> Result<Task> {
        self.run(task_id, TaskOperation::Assign { staff_id }).await
    }

    /// Start an assigned task.
    pub async fn start(&mut self, task_id: TaskId) -> Result<Task> {
        self.run(task_id, TaskOperation::Start).await
    }

    /// Start a task as `staff_id`, self-assigning a pending one.
    pub async fn start_by(&mut self, task_id: TaskId, staff_id: StaffId) -> Result<Task> {
        self.run(task_id, TaskOperation::StartBy { staff_id }).await
    }

    /// Pause a task in progress.
    pub async fn hold(&mut self, task_id: TaskId, reason: Option<String>) -> Result<Task> {
        self.run(task_id, TaskOperation::Hold { reason }).await
    }

    /// Pause a repair until parts arrive.
    pub async fn hold_for_parts(&mut self, task_id: TaskId) -> Result<Task> {
        self.run(task_id, TaskOperation::HoldForParts).await
    }

    /// Continue a paused task.
    pub async fn resume(&mut self, task_id: TaskId) -> Result<Task> {
        self.run(task_id, TaskOperation::Resume).await
    }

    /// Complete a task.
    pub async fn complete(&mut self, task_id: TaskId, report: CompletionReport) -> Result<Task> {
        self.run(task_id, TaskOperation::Complete(report)).await
    }

    /// Cancel a task.
    pub async fn cancel(&mut self, task_id: TaskId, reason: Option<String>) -> Result<Task> {
        self.run(task_id, TaskOperation::Cancel { reason }).await
    }

    /// Assign to the least loaded qualified staff member.
    pub async fn auto_assign(&mut self, task_id: TaskId) -> Result<Task> {
        match self.store.pick_assignee(task_id, self.config.max_workload) {
            Ok(staff_id) => self.assign(task_id, staff_id).await,
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Assign every listed `family` task to `staff_id`.
    ///
    /// Each task is planned locally first; one task that cannot be assigned
    /// rejects the whole batch before the backend is called. Returns the
    /// records that changed.
    pub async fn bulk_assign(
        &mut self,
        family: TaskFamily,
        task_ids: &[TaskId],
        staff_id: StaffId,
    ) -> Result<Vec<Task>> {
        let planned = self.store.plan_bulk_assign(task_ids, staff_id);
        let changed = match self.changed_ids(family, planned) {
            Ok(changed) => changed,
            Err(err) => return Err(self.fail(err)),
        };
        if changed.is_empty() {
            return Ok(Vec::new());
        }
        let outcome = self.backend.bulk_assign(family, &changed, staff_id, None).await;
        self.apply_bulk(family, "assign", outcome)
    }

    /// Move every listed `family` task to `status`, with the same all-or-nothing
    /// planning as [`bulk_assign`](Self::bulk_assign).
    pub async fn bulk_update_status(
        &mut self,
        family: TaskFamily,
        task_ids: &[TaskId],
        status: TaskStatus,
        notes: Option<String>,
    ) -> Result<Vec<Task>> {
        let planned = self.store.plan_bulk_status(task_ids, status, notes.clone());
        let changed = match self.changed_ids(family, planned) {
            Ok(changed) => changed,
            Err(err) => return Err(self.fail(err)),
        };
        if changed.is_empty() {
            return Ok(Vec::new());
        }
        let update = StatusUpdate::to(status).with_notes(notes);
        let outcome = self.backend.bulk_update_status(family, &changed, &update).await;
        self.apply_bulk(family, "update status", outcome)
    }

    /// Delete a task in any state.
    pub async fn delete(&mut self, task_id: TaskId) -> Result<()> {
        let family = match self.store.get(task_id) {
            Some(task) => task.family(),
            None => return Err(self.fail(OpsError::NotFound(format!("task {task_id}")))),
        };
        if let Err(err) = self.backend.delete_task(family, task_id).await {
            return Err(self.fail(err.into()));
        }
        self.store.delete(task_id)?;
        self.last_error = None;
        Ok(())
    }

    // Ids of `family` tasks whose planned record differs from the stored one.
    fn changed_ids(&self, family: TaskFamily, planned: Result<Vec<Task>>) -> Result<Vec<TaskId>> {
        let planned = planned?;
        if let Some(stray) = planned.iter().find(|t| t.family() != family) {
            return Err(OpsError::NotFound(format!("{} task {}", family, stray.id)));
        }
        Ok(planned
            .into_iter()
            .filter(|t| self.store.get(t.id) != Some(t))
            .map(|t| t.id)
            .collect())
    }

    fn apply_bulk(
        &mut self,
        family: TaskFamily,
        operation: &'static str,
        outcome: hotelops_storage::Result<Vec<Task>>,
    ) -> Result<Vec<Task>> {
        match outcome {
            Ok(stored) => {
                info!(%family, operation, count = stored.len(), "Applied bulk operation");
                self.store.merge(stored.clone());
                self.last_error = None;
                Ok(stored)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    async fn run(&mut self, task_id: TaskId, op: TaskOperation) -> Result<Task> {
        let current = match self.store.get(task_id) {
            Some(current) => current.clone(),
            None => return Err(self.fail(OpsError::NotFound(format!("task {task_id}")))),
        };
        let planned = match self.store.plan(task_id, &op) {
            Ok(planned) => planned,
            Err(err) => return Err(self.fail(err)),
        };
        if planned == current {
            return Ok(planned);
        }

        let family = current.family();
        let backend = Arc::clone(&self.backend);
        let outcome = match &op {
            TaskOperation::Assign { staff_id } => {
                backend.assign_task(family, task_id, *staff_id, None).await
            }
            TaskOperation::StartBy { staff_id } if current.status == TaskStatus::Pending => {
                // Only the started record is applied. If starting fails the
                // backend keeps the assignment until the next load.
                match backend.assign_task(family, task_id, *staff_id, None).await {
                    Ok(_) => {
                        let started = backend
                            .update_status(family, task_id, &StatusUpdate::to(TaskStatus::InProgress))
                            .await;
                        if started.is_err() {
                            warn!(%task_id, %staff_id, "Backend assigned the task but did not start it");
                        }
                        started
                    }
                    Err(err) => Err(err),
                }
            }
            TaskOperation::Start | TaskOperation::StartBy { .. } | TaskOperation::Resume => {
                backend
                    .update_status(family, task_id, &StatusUpdate::to(TaskStatus::InProgress))
                    .await
            }
            TaskOperation::Hold { reason } => {
                let update = StatusUpdate::to(TaskStatus::OnHold).with_notes(reason.clone());
                backend.update_status(family, task_id, &update).await
            }
            TaskOperation::HoldForParts => {
                backend
                    .update_status(family, task_id, &StatusUpdate::to(TaskStatus::WaitingForParts))
                    .await
            }
            TaskOperation::Complete(report) => {
                backend.update_status(family, task_id, &StatusUpdate::completed(report)).await
            }
            TaskOperation::Cancel { reason } => {
                let update = StatusUpdate::to(TaskStatus::Cancelled).with_notes(reason.clone());
                backend.update_status(family, task_id, &update).await
            }
        };

        match outcome {
            Ok(stored) => {
                info!(%task_id, operation = op.name(), status = %stored.status, "Applied operation");
                self.store.upsert(stored.clone());
                self.last_error = None;
                Ok(stored)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }
}
