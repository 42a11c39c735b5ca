//! Task views (Layer 2)
//!
//! Conjunctive filtering, urgency classification, stable sorting and
//! pagination over task collections, plus the per-family view state that
//! ties them together.

#![warn(missing_docs)]

pub mod filter;
pub mod urgency;
pub mod sort;
pub mod page;
pub mod view;

pub use filter::{apply_filters, matches_filter};
pub use urgency::{urgency, Urgency};
pub use sort::{sort_tasks, SortOrder};
pub use page::{paginate, Page};
pub use view::{TaskView, DEFAULT_PAGE_SIZE};
