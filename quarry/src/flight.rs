//! Single-flight execution keyed by cache entry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use quarry_core::QuarryError;

type SharedOutcome<V> = Shared<BoxFuture<'static, Result<V, QuarryError>>>;

/// At most one in-flight computation per key; concurrent callers share its outcome.
///
/// Each flight runs on its own spawned task, so dropping every waiter does not
/// cancel it. The task unregisters its key when it finishes (or unwinds).
pub(crate) struct FlightGroup<K, V> {
    inflight: Mutex<HashMap<K, SharedOutcome<V>>>,
}

impl<K, V> FlightGroup<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Join the flight for `key`, or start `make()` as a new one.
    ///
    /// The boolean is true when an existing flight was joined.
    pub(crate) fn join_or_start<F>(
        self: &Arc<Self>,
        key: &K,
        make: F,
    ) -> (SharedOutcome<V>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, QuarryError>>,
    {
        let mut map = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = map.get(key) {
            return (existing.clone(), true);
        }

        let landing = Landing {
            group: Arc::clone(self),
            key: key.clone(),
        };
        let fut = make();
        let handle = tokio::spawn(async move {
            let _landing = landing;
            fut.await
        });
        let shared = async move {
            handle.await.unwrap_or_else(|e| {
                Err(QuarryError::Internal(format!("resolution task failed: {e}")))
            })
        }
        .boxed()
        .shared();
        map.insert(key.clone(), shared.clone());
        (shared, false)
    }

    /// Number of flights currently registered.
    pub(crate) fn len(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn land(&self, key: &K) {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Unregisters a flight when its task ends, including on panic.
struct Landing<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    group: Arc<FlightGroup<K, V>>,
    key: K,
}

impl<K, V> Drop for Landing<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.group.land(&self.key);
    }
}
