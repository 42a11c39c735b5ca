//! JSON snapshot of one tenant's tasks and staff.
//!
//! A seed/fixture format for the in-memory backend and the CLI. Records are
//! kept in wire shape and decoded through [`crate::decode`].

use std::path::Path;
use serde::{Deserialize, Serialize};
use tokio::fs;
use hotelops_core::{Staff, Task, TaskFamily, TenantId};
use crate::decode::{decode_staff, decode_task, DecodeError, RawStaff, RawTask};

/// Errors reading or writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record did not decode
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Tasks and staff of both families.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    /// Tenant the records belong to
    pub tenant_id: String,
    /// Housekeeping tasks
    pub housekeeping_tasks: Vec<RawTask>,
    /// Maintenance tasks
    pub maintenance_tasks: Vec<RawTask>,
    /// Housekeeping staff
    pub housekeeping_staff: Vec<RawStaff>,
    /// Maintenance staff
    pub maintenance_staff: Vec<RawStaff>,
}

impl Snapshot {
    /// Empty snapshot for `tenant`.
    pub fn empty(tenant: &TenantId) -> Self {
        Self {
            tenant_id: tenant.to_string(),
            ..Default::default()
        }
    }

    /// Encode typed records.
    pub fn from_entities(tenant: &TenantId, tasks: &[Task], staff: &[Staff]) -> Self {
        let tasks_of = |family| tasks.iter().filter(|t| t.family() == family).map(RawTask::from).collect();
        let staff_of = |family| staff.iter().filter(|s| s.family == family).map(RawStaff::from).collect();
        Self {
            tenant_id: tenant.to_string(),
            housekeeping_tasks: tasks_of(TaskFamily::Servicing),
            maintenance_tasks: tasks_of(TaskFamily::Repair),
            housekeeping_staff: staff_of(TaskFamily::Servicing),
            maintenance_staff: staff_of(TaskFamily::Repair),
        }
    }

    /// Decode every record. Fails on the first bad one.
    pub fn decode(&self) -> Result<(Vec<Task>, Vec<Staff>), DecodeError> {
        let mut tasks = Vec::with_capacity(self.housekeeping_tasks.len() + self.maintenance_tasks.len());
        for raw in &self.housekeeping_tasks {
            tasks.push(decode_task(raw, TaskFamily::Servicing)?);
        }
        for raw in &self.maintenance_tasks {
            tasks.push(decode_task(raw, TaskFamily::Repair)?);
        }

        let mut staff = Vec::with_capacity(self.housekeeping_staff.len() + self.maintenance_staff.len());
        for raw in &self.housekeeping_staff {
            staff.push(decode_staff(raw, TaskFamily::Servicing)?);
        }
        for raw in &self.maintenance_staff {
            staff.push(decode_staff(raw, TaskFamily::Repair)?);
        }
        Ok((tasks, staff))
    }

    /// Read a snapshot file. A missing file yields `None`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Option<Self>, SnapshotError> {
        match fs::read_to_string(path.as_ref()).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the snapshot as pretty JSON, creating parent directories.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json.as_bytes()).await?;
        tracing::debug!(path = %path.display(), "Saved snapshot");
        Ok(())
    }
}
