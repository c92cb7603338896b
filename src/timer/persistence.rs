//! Deadline record kept in the durable store

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::services::KeyValueStore;

/// Absolute deadline of a running countdown plus the duration it was given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDeadline {
    /// Epoch milliseconds at which the budget reaches zero
    pub end_time: i64,
    pub duration: u64,
}

impl PersistedDeadline {
    pub fn new(now_millis: i64, remaining_seconds: u64, duration: u64) -> Self {
        let remaining_millis = i64::try_from(remaining_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        Self {
            end_time: now_millis.saturating_add(remaining_millis),
            duration,
        }
    }

    /// Whole seconds left until the deadline, floored, never negative
    pub fn remaining_at(&self, now_millis: i64) -> u64 {
        let millis = self.end_time.saturating_sub(now_millis).max(0);
        u64::try_from(millis / 1000).unwrap_or(0)
    }

    /// Read the record under `key`; missing or malformed entries read as `None`
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Option<Self> {
        let raw = store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(deadline) => Some(deadline),
            Err(e) => {
                warn!("Ignoring malformed persisted deadline under '{}': {}", key, e);
                None
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) {
        match serde_json::to_string(self) {
            Ok(json) => store.set(key, json),
            Err(e) => warn!("Failed to serialize deadline for '{}': {}", key, e),
        }
    }

    pub fn clear(store: &dyn KeyValueStore, key: &str) {
        debug!("Clearing persisted deadline '{}'", key);
        store.delete(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    #[test]
    fn uses_original_field_names() -> anyhow::Result<()> {
        let deadline = PersistedDeadline::new(1_000, 60, 60);
        let json = serde_json::to_string(&deadline)?;
        assert_eq!(json, r#"{"endTime":61000,"duration":60}"#);
        Ok(())
    }

    #[test]
    fn remaining_floors_and_clamps() {
        let deadline = PersistedDeadline { end_time: 10_000, duration: 60 };
        assert_eq!(deadline.remaining_at(0), 10);
        assert_eq!(deadline.remaining_at(500), 9);
        assert_eq!(deadline.remaining_at(10_000), 0);
        assert_eq!(deadline.remaining_at(99_000), 0);
    }

    #[test]
    fn malformed_entry_loads_as_none() {
        let store = MemoryStore::new();
        store.set("k", "{\"endTime\":\"soon\"}".to_string());
        assert_eq!(PersistedDeadline::load(&store, "k"), None);

        store.set("k", "garbage".to_string());
        assert_eq!(PersistedDeadline::load(&store, "k"), None);
    }
}
