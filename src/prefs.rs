// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Locally persisted display preferences.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Storage key for the furigana visibility flag.
pub const FURIGANA_VISIBLE_KEY: &str = "furigana-visible";

/// Preference storage errors.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("Preference file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Flat string key/value storage.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// In-memory store (tests, ephemeral sessions).
#[derive(Default, Clone)]
pub struct MemoryPreferenceStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// JSON file store: a single object mapping keys to string values.
///
/// The file is read on every `get` and rewritten on every `set`.
pub struct FilePreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, PrefsError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let parsed: BTreeMap<String, Value> = serde_json::from_str(&contents)?;
        Ok(parsed
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                Value::Bool(b) => Some((k, b.to_string())),
                _ => None,
            })
            .collect())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().ok()?;
        match self.load() {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read preferences");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // A corrupt file is replaced rather than blocking every write
        let mut values = self.load().unwrap_or_default();
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// Furigana visibility toggle backed by a preference store.
pub struct FuriganaPreference<S: PreferenceStore> {
    store: S,
    visible: bool,
    overridden: bool,
}

impl<S: PreferenceStore> FuriganaPreference<S> {
    /// Read the stored preference. Visible unless stored as anything but `"true"`.
    pub fn load(store: S) -> Self {
        let visible = store
            .get(FURIGANA_VISIBLE_KEY)
            .map(|saved| saved == "true")
            .unwrap_or(true);

        Self {
            store,
            visible,
            overridden: false,
        }
    }

    /// Use a caller-supplied value instead of the stored one.
    pub fn with_override(store: S, visible: bool) -> Self {
        Self {
            store,
            visible,
            overridden: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flip visibility and persist the new value. Returns the new value.
    ///
    /// Overridden preferences change locally but are never written.
    pub fn toggle(&mut self) -> Result<bool, PrefsError> {
        self.visible = !self.visible;
        if !self.overridden {
            self.store
                .set(FURIGANA_VISIBLE_KEY, if self.visible { "true" } else { "false" })?;
        }
        Ok(self.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_visible() {
        let pref = FuriganaPreference::load(MemoryPreferenceStore::default());
        assert!(pref.is_visible());
    }

    #[test]
    fn test_stored_value_is_read() {
        let store = MemoryPreferenceStore::default();
        store.set(FURIGANA_VISIBLE_KEY, "false").unwrap();
        assert!(!FuriganaPreference::load(store.clone()).is_visible());

        store.set(FURIGANA_VISIBLE_KEY, "garbage").unwrap();
        assert!(!FuriganaPreference::load(store.clone()).is_visible());

        store.set(FURIGANA_VISIBLE_KEY, "true").unwrap();
        assert!(FuriganaPreference::load(store).is_visible());
    }

    #[test]
    fn test_toggle_writes_every_time() {
        let store = MemoryPreferenceStore::default();
        let mut pref = FuriganaPreference::load(store.clone());

        assert!(!pref.toggle().unwrap());
        assert_eq!(store.get(FURIGANA_VISIBLE_KEY).as_deref(), Some("false"));

        assert!(pref.toggle().unwrap());
        assert_eq!(store.get(FURIGANA_VISIBLE_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn test_override_is_not_persisted() {
        let store = MemoryPreferenceStore::default();
        store.set(FURIGANA_VISIBLE_KEY, "true").unwrap();

        let mut pref = FuriganaPreference::with_override(store.clone(), false);
        assert!(!pref.is_visible());
        pref.toggle().unwrap();
        assert!(pref.is_visible());
        assert_eq!(store.get(FURIGANA_VISIBLE_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut pref = FuriganaPreference::load(FilePreferenceStore::new(&path));
        assert!(pref.is_visible());
        pref.toggle().unwrap();

        // A fresh reader sees the persisted value
        let reloaded = FuriganaPreference::load(FilePreferenceStore::new(&path));
        assert!(!reloaded.is_visible());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"furigana-visible\": \"false\""));
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FilePreferenceStore::new(&path);
        assert!(store.get(FURIGANA_VISIBLE_KEY).is_none());
        store.set(FURIGANA_VISIBLE_KEY, "false").unwrap();
        assert_eq!(store.get(FURIGANA_VISIBLE_KEY).as_deref(), Some("false"));
    }
}
