//! HotelOps core data models.
//!
//! Task and staff shapes, classification helpers, filter state and the
//! error type shared by every other HotelOps crate.

#![warn(missing_docs)]

mod id;
mod task;
mod staff;
mod filter;
mod request;
mod clock;
mod error;

pub use id::*;

pub use task::{
    Task, TaskFamily, TaskKind, ServicingType, RepairType, TaskStatus, Priority,
    is_servicing_task, is_repair_task, priority_weight, status_rank, format_duration,
};
pub use staff::{Staff, StaffFilter};
pub use filter::TaskFilter;
pub use request::{CreateTaskRequest, CompletionReport, StatusUpdate};
pub use clock::{Clock, SystemClock, FixedClock};
pub use error::{OpsError, FieldErrors, Result};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
