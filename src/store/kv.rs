use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;

use super::GraphError;

/// Flat key-value store for local state that must survive process restart:
/// daily goal counters, streak state, filter preferences. One key per field,
/// keyed exactly by the field's wire name.
#[derive(Debug)]
pub struct PrefsStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl PrefsStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| GraphError::Fetch(format!("read {}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| GraphError::Fetch(format!("parse {}: {e}", path.display())))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.as_u64()).map(|v| v as u32)
    }

    /// Replaces a batch of keys and flushes to disk in one write. The map is
    /// serialized while the lock is held; the disk write happens after it is
    /// released.
    pub async fn set_many<I>(&self, pairs: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let raw = {
            let mut entries = self.entries.lock();
            for (key, value) in pairs {
                entries.insert(key, value);
            }
            serde_json::to_string_pretty(&*entries)
                .map_err(|e| GraphError::Fetch(format!("serialize preferences: {e}")))?
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GraphError::Fetch(format!("create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| GraphError::Fetch(format!("write {}: {e}", self.path.display())))
    }

    pub async fn set(&self, key: &str, value: Value) -> Result<(), GraphError> {
        self.set_many([(key.to_string(), value)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let store = PrefsStore::open(&path).unwrap();
        store
            .set_many([
                ("topicsReviewedToday".to_string(), json!(4)),
                ("lastGoalResetDate".to_string(), json!("2024-01-01")),
            ])
            .await
            .unwrap();
        drop(store);

        let reopened = PrefsStore::open(&path).unwrap();
        assert_eq!(reopened.get_u32("topicsReviewedToday"), Some(4));
        assert_eq!(
            reopened.get_str("lastGoalResetDate").as_deref(),
            Some("2024-01-01")
        );
        assert_eq!(reopened.get("currentStreak"), None);
    }

    #[test]
    fn malformed_file_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "[oops").unwrap();
        let err = PrefsStore::open(&path).unwrap_err();
        assert!(matches!(err, GraphError::Fetch(_)));
    }
}
