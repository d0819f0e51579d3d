//! The single persisted click counter.

pub mod record;
pub mod store;
pub mod file_store;

pub use file_store::FileCounterStore;
pub use record::{ClickDelta, CounterRecord};
pub use store::{run_blocking, CounterStore, SharedCounterStore};
