//! Work Management (Layer 4)
//!
//! The task store and its status state machine, the create/complete rule
//! sets, runtime configuration, and the operations manager that couples the
//! store to a backend.

#![warn(missing_docs)]

pub mod rules;
pub mod transition;
pub mod store;
pub mod config;
pub mod manager;

pub use rules::{
    completion_rules, create_form, create_rules, report_values, request_values,
    validate_completion, validate_create,
};
pub use transition::{TaskOperation, Transition, TransitionValidator};
pub use store::{RefreshTicket, TaskStore};
pub use config::{ConfigError, OperationsConfig};
pub use manager::{FamilyPage, OperationsManager};
