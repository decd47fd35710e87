//! Persistence Adapter - in-progress drafts keyed by applicant email
//!
//! A draft is a JSON object of field name to string or bool. File fields
//! and the identity-derived fields are never stored: files cannot be
//! restored into a picker, and identity always comes from the session.

use crate::error::StoreError;
use crate::registry::FieldRegistry;
use crate::schema::FieldKind;
use crate::value::FieldValue;
use crate::{EMAIL_FIELD, NAME_FIELD};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Keyed string store, the moral equivalent of browser local storage
pub trait SnapshotStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn write(&self, key: &str, json: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store (for testing and development)
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, json: &str) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '@') { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, json: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), json)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Stored form of one field value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Flag(bool),
    Text(String),
}

impl SnapshotValue {
    /// Coerce to a checkbox state
    pub fn as_flag(&self) -> bool {
        match self {
            SnapshotValue::Flag(b) => *b,
            SnapshotValue::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes"),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            SnapshotValue::Flag(b) => b.to_string(),
            SnapshotValue::Text(s) => s.clone(),
        }
    }
}

/// Field name to stored value
pub type PersistedSnapshot = BTreeMap<String, SnapshotValue>;

pub struct PersistenceAdapter {
    store: Arc<dyn SnapshotStore>,
    key: Option<String>,
}

impl PersistenceAdapter {
    /// Scope drafts to `email`; without one every operation is a no-op
    pub fn new(store: Arc<dyn SnapshotStore>, prefix: &str, email: Option<&str>) -> Self {
        let key = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| format!("{}{}", prefix, e.to_lowercase()));
        Self { store, key }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Capture the storable part of the current values
    pub fn snapshot(registry: &FieldRegistry, values: &HashMap<String, FieldValue>) -> PersistedSnapshot {
        registry
            .all_fields()
            .filter(|f| f.kind != FieldKind::File && f.name != NAME_FIELD && f.name != EMAIL_FIELD)
            .filter_map(|f| {
                let stored = match values.get(&f.name)? {
                    FieldValue::Text(s) => SnapshotValue::Text(s.clone()),
                    FieldValue::Flag(b) => SnapshotValue::Flag(*b),
                    FieldValue::Choice(c) => SnapshotValue::Text(c.clone().unwrap_or_default()),
                    FieldValue::File(_) => return None,
                };
                Some((f.name.clone(), stored))
            })
            .collect()
    }

    pub fn save(&self, registry: &FieldRegistry, values: &HashMap<String, FieldValue>) -> Result<(), StoreError> {
        self.write_snapshot(&Self::snapshot(registry, values))
    }

    pub fn write_snapshot(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError> {
        let Some(key) = &self.key else { return Ok(()) };
        self.store.write(key, &serde_json::to_string(snapshot)?)?;
        tracing::debug!(key = %key, fields = snapshot.len(), "draft saved");
        Ok(())
    }

    /// Read the draft; absence and unreadable content both yield an empty snapshot
    pub fn load(&self) -> Result<PersistedSnapshot, StoreError> {
        let Some(key) = &self.key else { return Ok(PersistedSnapshot::new()) };
        let Some(raw) = self.store.read(key)? else { return Ok(PersistedSnapshot::new()) };
        match serde_json::from_str::<HashMap<String, serde_json::Value>>(&raw) {
            Ok(entries) => Ok(entries
                .into_iter()
                .filter_map(|(name, value)| match value {
                    serde_json::Value::Bool(b) => Some((name, SnapshotValue::Flag(b))),
                    serde_json::Value::String(s) => Some((name, SnapshotValue::Text(s))),
                    serde_json::Value::Number(n) => Some((name, SnapshotValue::Text(n.to_string()))),
                    _ => None,
                })
                .collect()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding unreadable draft");
                Ok(PersistedSnapshot::new())
            }
        }
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        if let Some(key) = &self.key {
            self.store.remove(key)?;
            tracing::debug!(key = %key, "draft cleared");
        }
        Ok(())
    }
}
