//! Operations statistics (Layer 3)
//!
//! Per-family dashboard summaries, staff performance and the recent-activity
//! feed, all derived from a task collection. Missing inputs count as zero;
//! nothing is ever estimated or invented.

#![warn(missing_docs)]

pub mod summary;
pub mod performance;
pub mod activity;

pub use summary::{family_stats, operations_stats, FamilyStats, OperationsStats};
pub use performance::{
    calculate_average_rating, calculate_completion_rate, calculate_efficiency,
    refresh_staff_aggregates, staff_performance, StaffPerformance,
};
pub use activity::{recent_activity, ActivityAction, RecentActivity};
