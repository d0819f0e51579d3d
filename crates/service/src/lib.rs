//! Service layer owning the persisted click counter.
//! - `counter` holds the record type, the store abstraction and its file-backed implementation.
//! - `observability` exposes Prometheus counters for store events.

pub mod errors;
pub mod counter;
pub mod observability;
