//! Staff model - people tasks get assigned to.

use serde::{Deserialize, Serialize};
use crate::id::{StaffId, TenantId};
use crate::task::{TaskFamily, TaskKind};

/// A housekeeping or maintenance staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    /// Roster identifier
    pub id: StaffId,

    /// Linked user account
    pub user_id: u64,

    /// Display name
    pub name: String,

    /// Family of work this person does
    pub family: TaskFamily,

    /// Task kinds this person is qualified for (same family only)
    #[serde(default)]
    pub specializations: Vec<TaskKind>,

    /// Inactive staff cannot receive new assignments
    pub is_active: bool,

    /// Derived: mean rating over completed tasks
    #[serde(default)]
    pub average_rating: f64,

    /// Derived: number of completed tasks
    #[serde(default)]
    pub total_tasks_completed: u32,

    /// Owning tenant
    pub tenant_id: TenantId,
}

impl Staff {
    /// Whether this person may take a task of `kind`.
    ///
    /// An empty specialization list means "no specialization data", which
    /// qualifies the person for every kind of their family.
    pub fn is_qualified_for(&self, kind: TaskKind) -> bool {
        kind.family() == self.family
            && (self.specializations.is_empty() || self.specializations.contains(&kind))
    }
}

/// Staff listing filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffFilter {
    /// Only active (or only inactive) staff
    pub is_active: Option<bool>,

    /// Staff qualified for any of these kinds
    #[serde(default)]
    pub specialization: Vec<TaskKind>,
}

impl StaffFilter {
    /// Whether `staff` passes this filter.
    pub fn matches(&self, staff: &Staff) -> bool {
        if let Some(active) = self.is_active {
            if staff.is_active != active {
                return false;
            }
        }
        self.specialization.is_empty()
            || self.specialization.iter().any(|kind| staff.is_qualified_for(*kind))
    }
}
