use std::sync::Arc;

use tracing::error;

use crate::counter::record::{ClickDelta, CounterRecord};
use crate::errors::ServiceError;

/// Read/modify/write access to the single counter record.
/// Implementations perform blocking I/O; async callers go through [`run_blocking`].
pub trait CounterStore: Send + Sync {
    /// Current record, initializing (or resetting) it when absent or unreadable.
    fn load(&self) -> Result<CounterRecord, ServiceError>;

    /// Persist `record` wholesale. Failures are logged and reported as `false`.
    fn save(&self, record: &CounterRecord) -> bool;

    /// Add `delta` to the stored count and persist the result.
    fn increment(&self, delta: ClickDelta) -> Result<CounterRecord, ServiceError>;
}

pub type SharedCounterStore = Arc<dyn CounterStore>;

/// Run a store operation on tokio's blocking pool.
pub async fn run_blocking<T, F>(store: &SharedCounterStore, f: F) -> Result<T, ServiceError>
where
    F: FnOnce(&dyn CounterStore) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| {
            if e.is_panic() {
                error!(error = %e, "counter store panicked");
                ServiceError::Panicked
            } else {
                ServiceError::Task(e.to_string())
            }
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::record::{ClickDelta, CounterRecord};

    struct PanickingStore;

    impl CounterStore for PanickingStore {
        fn load(&self) -> Result<CounterRecord, ServiceError> {
            panic!("secret internal detail")
        }

        fn save(&self, _record: &CounterRecord) -> bool {
            false
        }

        fn increment(&self, _delta: ClickDelta) -> Result<CounterRecord, ServiceError> {
            Err(ServiceError::SaveFailed)
        }
    }

    #[tokio::test]
    async fn panic_in_store_hides_its_message() {
        let store: SharedCounterStore = Arc::new(PanickingStore);
        let err = run_blocking(&store, |s| s.load()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Panicked));
        assert_eq!(err.to_string(), "internal server error");
    }
}
