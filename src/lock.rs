//! Keyed locks
//!
//! Serializes mutations of one parent resource (the rules of one firewall)
//! while leaving different parents free to proceed concurrently. Entries are
//! removed once no holder or waiter references them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct KeyedLock {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held lock for one key; releases and cleans up on drop
#[derive(Debug)]
pub struct KeyedGuard<'a> {
    owner: &'a KeyedLock,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        // the map holds no invariants a panicking holder could break
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Locked map with unreferenced entries dropped
    ///
    /// A waiter cancelled after the holder released leaves its entry behind;
    /// every access sweeps those up.
    fn live_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        let mut entries = self.entries();
        entries.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        entries
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let mutex = self
            .live_entries()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        tracing::trace!("acquired lock for {}", key);
        KeyedGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on
    pub fn len(&self) -> usize {
        self.live_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut entries = self.owner.entries();
        if let Some(mutex) = entries.get(&self.key) {
            // only the map's own reference is left
            if Arc::strong_count(mutex) == 1 {
                entries.remove(&self.key);
            }
        }
    }
}

/// Process-wide locks for firewall rule mutations, keyed by firewall ID
pub fn firewall_locks() -> &'static KeyedLock {
    static LOCKS: OnceLock<KeyedLock> = OnceLock::new();
    LOCKS.get_or_init(KeyedLock::new)
}
