//! Per-key lazily initialised cache with at most one initialiser in flight
//! per key.
//!
//! Concurrent callers for the same key share one `OnceCell`: the first runs
//! the initialiser, the rest await its result. A failed initialiser drops
//! the key's entry once no other caller is waiting on it, so a later call
//! retries and failed keys do not accumulate.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

pub struct SingleFlight<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_init<F, Fut, E>(&self, key: &K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(key.clone()).or_default().clone()
        };

        let result = cell.get_or_try_init(init).await.cloned();
        if result.is_err() {
            self.forget_failed(key, &cell).await;
        }
        result
    }

    async fn forget_failed(&self, key: &K, cell: &Arc<OnceCell<V>>) {
        let mut cells = self.cells.lock().await;
        let unused = cells.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, cell) && !current.initialized() && Arc::strong_count(current) <= 2
        });
        if unused {
            cells.remove(key);
        }
    }

    /// Number of keys holding an initialised value.
    pub async fn len(&self) -> usize {
        let cells = self.cells.lock().await;
        cells.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    pub(crate) async fn entry_count(&self) -> usize {
        self.cells.lock().await.len()
    }
}
