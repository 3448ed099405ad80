//! Per-key debounce table
//!
//! Scheduling a job for a key aborts the job still waiting for that key.
//! Replacing the entry and aborting the old task happen under one lock, so two
//! rapid schedules can never both fire.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;

struct Pending {
    generation: u64,
    abort: AbortHandle,
}

#[derive(Default)]
pub struct Debouncer {
    pending: Arc<Mutex<HashMap<String, Pending>>>,
    next_generation: AtomicU64,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` after `delay` unless `key` is scheduled or cancelled again first
    ///
    /// Once a job has started it runs to completion; only waiting jobs are
    /// superseded.
    pub async fn schedule<F>(&self, key: impl Into<String>, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let mut pending = self.pending.lock().await;
        let table = Arc::clone(&self.pending);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut table = table.lock().await;
                if table.get(&task_key).is_none_or(|entry| entry.generation != generation) {
                    return;
                }
                table.remove(&task_key);
            }
            job.await;
        });

        let replaced = pending.insert(
            key,
            Pending {
                generation,
                abort: handle.abort_handle(),
            },
        );
        if let Some(previous) = replaced {
            previous.abort.abort();
            tracing::trace!("Superseded pending job (generation {})", previous.generation);
        }
    }

    /// Drop the waiting job for `key`; returns whether one existed
    pub async fn cancel(&self, key: &str) -> bool {
        match self.pending.lock().await.remove(key) {
            Some(previous) => {
                previous.abort.abort();
                true
            }
            None => false,
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
