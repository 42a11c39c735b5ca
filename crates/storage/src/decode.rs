//! Wire payloads and the typed decode step.
//!
//! Backends speak loosely typed JSON: ids may be numbers or strings, enum
//! values are upper-case strings, timestamps are RFC 3339. [`decode_task`]
//! and [`decode_staff`] turn those payloads into the typed model or fail with
//! a [`DecodeError`]; nothing past this module handles raw data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use hotelops_core::{
    Priority, RepairType, ServicingType, Staff, StaffId, Task, TaskFamily, TaskId, TaskKind,
    TaskStatus, TenantId, Time,
};

/// Why a payload could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// A required field is absent
    #[error("missing field `{0}`")]
    Missing(&'static str),

    /// A field holds a value of the wrong shape
    #[error("invalid `{field}`: {value}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// The fields decode but contradict each other
    #[error("inconsistent task {id}: {reason}")]
    Inconsistent {
        /// Task id
        id: String,
        /// Violated rules
        reason: String,
    },
}

fn invalid(field: &'static str, value: impl ToString) -> DecodeError {
    DecodeError::Invalid { field, value: value.to_string() }
}

/// Task as sent over the wire.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_number: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_staff_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Linked user account on a staff payload.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Staff member as sent over the wire.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStaff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<RawUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    pub specializations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tasks_completed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Decode a task payload of `family`.
pub fn decode_task(raw: &RawTask, family: TaskFamily) -> Result<Task, DecodeError> {
    let id = match raw.id.as_ref().ok_or(DecodeError::Missing("id"))? {
        Value::String(s) => s.trim().parse::<TaskId>().map_err(|_| invalid("id", s))?,
        other => return Err(invalid("id", other)),
    };

    let title = raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(DecodeError::Missing("title"))?
        .to_string();

    let kind = parse_kind(family, raw.task_type.as_deref().ok_or(DecodeError::Missing("taskType"))?)?;

    let status_text = raw.status.as_deref().ok_or(DecodeError::Missing("status"))?;
    let status: TaskStatus = status_text.parse().map_err(|_| invalid("status", status_text))?;

    let priority_text = raw.priority.as_deref().ok_or(DecodeError::Missing("priority"))?;
    let priority: Priority = priority_text.parse().map_err(|_| invalid("priority", priority_text))?;

    let created_at = parse_time("createdAt", raw.created_at.as_deref())?.ok_or(DecodeError::Missing("createdAt"))?;
    let updated_at = parse_time("updatedAt", raw.updated_at.as_deref())?.unwrap_or(created_at);
    let repair = family == TaskFamily::Repair;

    let task = Task {
        id,
        title,
        description: raw.description.clone().unwrap_or_default(),
        kind,
        status,
        priority,
        room_number: non_blank(&raw.room_number),
        floor_number: raw.floor_number.map(|n| whole("floorNumber", n)).transpose()?,
        equipment_type: non_blank(&raw.equipment_type).filter(|_| repair),
        estimated_duration: raw
            .estimated_duration
            .map(|n| minutes("estimatedDuration", n))
            .transpose()?
            .unwrap_or(0),
        estimated_cost: raw.estimated_cost.map(|c| cost("estimatedCost", c)).transpose()?.filter(|_| repair),
        actual_duration: raw.actual_duration.map(|n| minutes("actualDuration", n)).transpose()?,
        actual_cost: raw.actual_cost.map(|c| cost("actualCost", c)).transpose()?,
        parts_used: non_blank(&raw.parts_used),
        rating: raw.rating.map(rating).transpose()?,
        assigned_staff_id: parse_staff_id("assignedStaffId", raw.assigned_staff_id.as_ref())?,
        supervisor_id: parse_staff_id("supervisorId", raw.supervisor_id.as_ref())?,
        due_date: parse_time("dueDate", raw.due_date.as_deref())?.ok_or(DecodeError::Missing("dueDate"))?,
        start_time: parse_time("startTime", raw.start_time.as_deref())?,
        completion_time: parse_time("completionTime", raw.completion_time.as_deref())?,
        notes: non_blank(&raw.notes),
        created_at,
        updated_at,
        tenant_id: TenantId::new(
            non_blank(&raw.tenant_id).ok_or(DecodeError::Missing("tenantId"))?,
        ),
    };

    let violations = task.invariant_violations();
    if !violations.is_empty() {
        return Err(DecodeError::Inconsistent {
            id: task.id.to_string(),
            reason: violations.join("; "),
        });
    }
    Ok(task)
}

/// Decode a staff payload of `family`.
pub fn decode_staff(raw: &RawStaff, family: TaskFamily) -> Result<Staff, DecodeError> {
    let id = parse_staff_id("id", raw.id.as_ref())?.ok_or(DecodeError::Missing("id"))?;
    let user_id = parse_staff_id("userId", raw.user_id.as_ref())?.map(|u| u.0).unwrap_or(0);

    let from_user = raw.user.as_ref().map(|user| {
        [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    });
    let name = non_blank(&raw.name)
        .or(from_user.filter(|n| !n.is_empty()))
        .or(non_blank(&raw.employee_id))
        .unwrap_or_else(|| format!("Staff {id}"));

    let specializations = raw
        .specializations
        .iter()
        .map(|s| parse_kind(family, s))
        .collect::<Result<Vec<_>, _>>()?;

    let average_rating = match raw.average_rating {
        Some(r) if !(0.0..=5.0).contains(&r) => return Err(invalid("averageRating", r)),
        Some(r) => r,
        None => 0.0,
    };
    let total_tasks_completed = raw
        .total_tasks_completed
        .map(|n| minutes("totalTasksCompleted", n))
        .transpose()?
        .unwrap_or(0);

    Ok(Staff {
        id,
        user_id,
        name,
        family,
        specializations,
        is_active: raw.is_active.unwrap_or(true),
        average_rating,
        total_tasks_completed,
        tenant_id: TenantId::new(non_blank(&raw.tenant_id).ok_or(DecodeError::Missing("tenantId"))?),
    })
}

impl From<&Task> for RawTask {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(Value::String(task.id.to_string())),
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            task_type: Some(kind_wire_name(task.kind)),
            status: Some(wire_name(&task.status)),
            priority: Some(wire_name(&task.priority)),
            room_number: task.room_number.clone(),
            floor_number: task.floor_number.map(f64::from),
            equipment_type: task.equipment_type.clone(),
            estimated_duration: Some(f64::from(task.estimated_duration)),
            estimated_cost: task.estimated_cost,
            actual_duration: task.actual_duration.map(f64::from),
            actual_cost: task.actual_cost,
            parts_used: task.parts_used.clone(),
            rating: task.rating.map(f64::from),
            assigned_staff_id: task.assigned_staff_id.map(|s| Value::from(s.0)),
            supervisor_id: task.supervisor_id.map(|s| Value::from(s.0)),
            due_date: Some(task.due_date.to_rfc3339()),
            start_time: task.start_time.map(|t| t.to_rfc3339()),
            completion_time: task.completion_time.map(|t| t.to_rfc3339()),
            notes: task.notes.clone(),
            created_at: Some(task.created_at.to_rfc3339()),
            updated_at: Some(task.updated_at.to_rfc3339()),
            tenant_id: Some(task.tenant_id.to_string()),
        }
    }
}

impl From<&Staff> for RawStaff {
    fn from(staff: &Staff) -> Self {
        Self {
            id: Some(Value::from(staff.id.0)),
            user_id: Some(Value::from(staff.user_id)),
            name: Some(staff.name.clone()),
            user: None,
            employee_id: None,
            specializations: staff.specializations.iter().map(|k| kind_wire_name(*k)).collect(),
            is_active: Some(staff.is_active),
            average_rating: Some(staff.average_rating),
            total_tasks_completed: Some(f64::from(staff.total_tasks_completed)),
            tenant_id: Some(staff.tenant_id.to_string()),
        }
    }
}

/// Parse a wire kind name (`ROOM_CLEANING`, `hvac`, `Deep Cleaning`) of `family`.
pub fn parse_kind(family: TaskFamily, text: &str) -> Result<TaskKind, DecodeError> {
    let value = Value::String(text.trim().to_ascii_uppercase().replace([' ', '-'], "_"));
    let kind = match family {
        TaskFamily::Servicing => serde_json::from_value::<ServicingType>(value).map(TaskKind::Servicing),
        TaskFamily::Repair => serde_json::from_value::<RepairType>(value).map(TaskKind::Repair),
    };
    kind.map_err(|_| invalid("taskType", text))
}

fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        _ => String::new(),
    }
}

fn kind_wire_name(kind: TaskKind) -> String {
    match kind {
        TaskKind::Servicing(t) => wire_name(&t),
        TaskKind::Repair(t) => wire_name(&t),
    }
}

fn parse_time(field: &'static str, text: Option<&str>) -> Result<Option<Time>, DecodeError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(None),
        Some(t) => chrono::DateTime::parse_from_rfc3339(t)
            .map(|dt| Some(dt.with_timezone(&chrono::Utc)))
            .map_err(|_| invalid(field, t)),
    }
}

fn parse_staff_id(field: &'static str, value: Option<&Value>) -> Result<Option<StaffId>, DecodeError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(|id| Some(StaffId(id))).ok_or_else(|| invalid(field, n)),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.parse::<StaffId>().map(Some).map_err(|_| invalid(field, s)),
        Some(other) => Err(invalid(field, other)),
    }
}

fn whole(field: &'static str, n: f64) -> Result<i32, DecodeError> {
    if n.fract() != 0.0 || n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
        return Err(invalid(field, n));
    }
    Ok(n as i32)
}

fn minutes(field: &'static str, n: f64) -> Result<u32, DecodeError> {
    if n.fract() != 0.0 || n < 0.0 || n > f64::from(u32::MAX) {
        return Err(invalid(field, n));
    }
    Ok(n as u32)
}

fn cost(field: &'static str, c: f64) -> Result<f64, DecodeError> {
    if !c.is_finite() || c < 0.0 {
        return Err(invalid(field, c));
    }
    Ok(c)
}

fn rating(r: f64) -> Result<u8, DecodeError> {
    if r.fract() != 0.0 || !(1.0..=5.0).contains(&r) {
        return Err(invalid("rating", r));
    }
    Ok(r as u8)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn maintenance_payload() -> serde_json::Value {
        json!({
            "id": TaskId::new().to_string(),
            "title": "Leaking radiator",
            "taskType": "HVAC",
            "status": "OPEN",
            "priority": "HIGH",
            "roomNumber": "512",
            "floorNumber": 5,
            "equipmentType": "Radiator",
            "estimatedDuration": 90,
            "estimatedCost": 45.5,
            "dueDate": "2026-03-02T12:00:00Z",
            "createdAt": "2026-03-01T08:00:00Z",
            "updatedAt": "2026-03-01T08:00:00Z",
            "tenantId": "hotel-1"
        })
    }

    #[test]
    fn test_decode_maintenance_task_with_open_status() {
        let raw: RawTask = serde_json::from_value(maintenance_payload()).unwrap();
        let task = decode_task(&raw, TaskFamily::Repair).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.kind, TaskKind::Repair(RepairType::Hvac));
        assert_eq!(task.estimated_cost, Some(45.5));
        assert_eq!(task.floor_number, Some(5));
    }

    #[test]
    fn test_decode_rejects_kind_from_other_family() {
        let raw: RawTask = serde_json::from_value(maintenance_payload()).unwrap();
        let err = decode_task(&raw, TaskFamily::Servicing).unwrap_err();
        assert_eq!(err, invalid("taskType", "HVAC"));
    }

    #[test]
    fn test_decode_reports_missing_and_malformed_fields() {
        let mut payload = maintenance_payload();
        payload.as_object_mut().unwrap().remove("dueDate");
        let raw: RawTask = serde_json::from_value(payload).unwrap();
        assert_eq!(decode_task(&raw, TaskFamily::Repair).unwrap_err(), DecodeError::Missing("dueDate"));

        let mut payload = maintenance_payload();
        payload["rating"] = json!(7);
        let raw: RawTask = serde_json::from_value(payload).unwrap();
        assert!(matches!(
            decode_task(&raw, TaskFamily::Repair),
            Err(DecodeError::Invalid { field: "rating", .. })
        ));

        let mut payload = maintenance_payload();
        payload["id"] = json!(42);
        let raw: RawTask = serde_json::from_value(payload).unwrap();
        assert!(matches!(decode_task(&raw, TaskFamily::Repair), Err(DecodeError::Invalid { field: "id", .. })));
    }

    #[test]
    fn test_decode_rejects_inconsistent_records() {
        let mut payload = maintenance_payload();
        payload["status"] = json!("IN_PROGRESS");
        let raw: RawTask = serde_json::from_value(payload).unwrap();
        assert!(matches!(
            decode_task(&raw, TaskFamily::Repair),
            Err(DecodeError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_string_staff_ids_are_accepted() {
        let mut payload = maintenance_payload();
        payload["status"] = json!("ASSIGNED");
        payload["assignedStaffId"] = json!("7");
        let raw: RawTask = serde_json::from_value(payload).unwrap();
        let task = decode_task(&raw, TaskFamily::Repair).unwrap();
        assert_eq!(task.assigned_staff_id, Some(StaffId(7)));
    }

    #[test]
    fn test_encoded_task_decodes_to_the_same_record() {
        let raw: RawTask = serde_json::from_value(maintenance_payload()).unwrap();
        let task = decode_task(&raw, TaskFamily::Repair).unwrap();
        let again = decode_task(&RawTask::from(&task), TaskFamily::Repair).unwrap();
        assert_eq!(task, again);
    }

    #[test]
    fn test_decode_staff_name_fallbacks_and_specializations() {
        let raw: RawStaff = serde_json::from_value(json!({
            "id": 7,
            "userId": 70,
            "user": { "firstName": "Almaz", "lastName": "Tesfaye" },
            "specializations": ["ROOM_CLEANING", "laundry"],
            "isActive": true,
            "averageRating": 4.6,
            "totalTasksCompleted": 31,
            "tenantId": "hotel-1"
        }))
        .unwrap();
        let staff = decode_staff(&raw, TaskFamily::Servicing).unwrap();
        assert_eq!(staff.name, "Almaz Tesfaye");
        assert_eq!(
            staff.specializations,
            vec![
                TaskKind::Servicing(ServicingType::RoomCleaning),
                TaskKind::Servicing(ServicingType::Laundry)
            ]
        );
        assert_eq!(staff.total_tasks_completed, 31);

        let bad = RawStaff { specializations: vec!["PLUMBING".into()], ..raw };
        assert!(decode_staff(&bad, TaskFamily::Servicing).is_err());
    }
}
