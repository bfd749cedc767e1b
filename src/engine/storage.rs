use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::error;

use crate::engine::Persistence;
use crate::{Error, Result};

/// Five megabytes, the usual per-origin budget of browser storage.
pub const DEFAULT_QUOTA: usize = 5 * 1024 * 1024;

/// A process-wide `key -> string` store with a hard byte budget.
///
/// Usage is measured as the sum of key and value lengths. A write that would
/// push usage over the quota fails with [`Error::QuotaExceeded`] and leaves
/// the store untouched. When a [`Persistence`] is attached, every successful
/// write is mirrored to disk before the call returns.
pub struct LocalStorage {
    data: RwLock<HashMap<String, String>>,
    quota: usize,
    persistence: Option<Arc<Persistence>>,
}

impl LocalStorage {
    pub fn new(initial_data: HashMap<String, String>, quota: usize, persistence: Option<Arc<Persistence>>) -> Self {
        Self {
            data: RwLock::new(initial_data),
            quota,
            persistence,
        }
    }

    /// A memory-only store with the given budget.
    pub fn in_memory(quota: usize) -> Self {
        Self::new(HashMap::new(), quota, None)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }

    fn used(data: &HashMap<String, String>) -> usize {
        data.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Bytes currently in use.
    pub fn usage(&self) -> usize {
        Self::used(&self.read())
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut data = self.write();
            let current = data.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let used_by_others = Self::used(&data) - current;
            let needed = key.len() + value.len();
            if used_by_others + needed > self.quota {
                return Err(Error::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available: self.quota.saturating_sub(used_by_others),
                });
            }
            data.insert(key.to_string(), value.to_string());
        }
        if let Some(p) = &self.persistence {
            if let Err(e) = p.save_item(key, value) {
                error!("Failed to persist storage key {}: {}", key, e);
            }
        }
        Ok(())
    }

    pub fn remove_item(&self, key: &str) {
        let removed = self.write().remove(key).is_some();
        if removed {
            if let Some(p) = &self.persistence {
                if let Err(e) = p.remove_item(key) {
                    error!("Failed to remove persisted storage key {}: {}", key, e);
                }
            }
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
