//! Backend trait abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use hotelops_core::{
    CreateTaskRequest, OpsError, Staff, StaffFilter, StaffId, StatusUpdate, Task, TaskFamily,
    TaskFilter, TaskId,
};
use hotelops_stats::{OperationsStats, RecentActivity, StaffPerformance};
use hotelops_view::Page;
use crate::decode::DecodeError;

/// Error type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur while talking to a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload did not decode into typed entities
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused or failed the call
    #[error("{0}")]
    Transport(String),
}

impl From<BackendError> for OpsError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => OpsError::NotFound(what),
            BackendError::Decode(e) => OpsError::Decode(e.to_string()),
            BackendError::Json(e) => OpsError::Decode(e.to_string()),
            BackendError::Io(e) => OpsError::Transport(e.to_string()),
            BackendError::Transport(message) => OpsError::Transport(message),
        }
    }
}

/// One page of a backend listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Items across all pages
    pub total_elements: usize,
    /// Number of pages
    pub total_pages: usize,
    /// Zero-based page index
    pub current_page: usize,
    /// Requested page size
    pub page_size: usize,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            items: page.items,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            current_page: page.page,
            page_size: page.page_size,
        }
    }
}

/// Remote collaborator holding the tasks and staff of one tenant.
///
/// Implementations own transport and persistence; the core only sees typed
/// entities and [`BackendError`].
#[async_trait]
pub trait OperationsBackend: Send + Sync {
    // === Task operations ===

    /// List one page of a family's tasks matching `filter`.
    async fn list_tasks(
        &self,
        family: TaskFamily,
        page: usize,
        page_size: usize,
        filter: &TaskFilter,
    ) -> Result<PageResponse<Task>>;

    /// Create a task; returns the stored record.
    async fn create_task(&self, family: TaskFamily, request: &CreateTaskRequest) -> Result<Task>;

    /// Change a task's status; returns the stored record.
    async fn update_status(
        &self,
        family: TaskFamily,
        task_id: TaskId,
        update: &StatusUpdate,
    ) -> Result<Task>;

    /// Assign a task; returns the stored record.
    async fn assign_task(
        &self,
        family: TaskFamily,
        task_id: TaskId,
        staff_id: StaffId,
        notes: Option<String>,
    ) -> Result<Task>;

    /// Assign every listed task to one staff member; returns the stored
    /// records. Nothing changes unless every task can be assigned.
    async fn bulk_assign(
        &self,
        family: TaskFamily,
        task_ids: &[TaskId],
        staff_id: StaffId,
        notes: Option<String>,
    ) -> Result<Vec<Task>>;

    /// Apply one status change to every listed task; returns the stored
    /// records. Nothing changes unless every task accepts the update.
    async fn bulk_update_status(
        &self,
        family: TaskFamily,
        task_ids: &[TaskId],
        update: &StatusUpdate,
    ) -> Result<Vec<Task>>;

    /// Remove a task.
    async fn delete_task(&self, family: TaskFamily, task_id: TaskId) -> Result<()>;

    // === Staff operations ===

    /// List a family's staff.
    async fn list_staff(&self, family: TaskFamily, filter: &StaffFilter) -> Result<Vec<Staff>>;

    // === Dashboard ===

    /// Summary of both families.
    async fn get_stats(&self) -> Result<OperationsStats>;

    /// Performance of every staff member.
    async fn get_staff_performance(&self) -> Result<Vec<StaffPerformance>>;

    /// Newest events, at most `limit`.
    async fn get_recent_activity(&self, limit: usize) -> Result<Vec<RecentActivity>>;
}
