use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug)]
struct Entry {
    lock: Arc<AsyncMutex<()>>,
    /// Holder plus waiters.
    users: usize,
}

/// Per-thread locks so that refreshes of the same thread never overlap.
/// Entries exist only while someone holds or waits for them, including
/// waiters that give up before getting the lock.
#[derive(Debug, Default)]
pub struct RefreshLocks {
    entries: Mutex<HashMap<String, Entry>>,
}

impl RefreshLocks {
    /// Wait until no one else holds `thread_id`, then hold it until the
    /// returned guard is dropped.
    pub async fn acquire(&self, thread_id: &str) -> RefreshGuard<'_> {
        let lock = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = entries
                .entry(thread_id.to_string())
                .or_insert_with(|| Entry {
                    lock: Arc::new(AsyncMutex::new(())),
                    users: 0,
                });
            entry.users += 1;
            entry.lock.clone()
        };

        // Registered before waiting, so a cancelled wait still releases the entry.
        let mut guard = RefreshGuard {
            locks: self,
            thread_id: thread_id.to_string(),
            guard: None,
        };
        guard.guard = Some(lock.lock_owned().await);
        guard
    }

    /// Number of threads currently held or waited on.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct RefreshGuard<'a> {
    locks: &'a RefreshLocks,
    thread_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut entries = self
            .locks
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(&self.thread_id) {
            entry.users -= 1;
            if entry.users == 0 {
                entries.remove(&self.thread_id);
            }
        }
    }
}
