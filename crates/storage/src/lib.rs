//! Backend boundary for HotelOps.
//!
//! The [`OperationsBackend`] trait is the only way task and staff data enters
//! or leaves the core. Payloads are decoded into typed entities at this
//! boundary; an in-memory backend and a JSON snapshot format back the CLI
//! and the tests.

#![warn(missing_docs)]

pub mod trait_;
pub mod decode;
pub mod snapshot;
pub mod memory;

pub use trait_::{OperationsBackend, BackendError, PageResponse, Result};
pub use decode::{decode_staff, decode_task, parse_kind, DecodeError, RawStaff, RawTask, RawUser};
pub use snapshot::{Snapshot, SnapshotError};
pub use memory::InMemoryBackend;
