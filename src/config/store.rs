//! Runtime key-path configuration store
//!
//! Values are looked up by dotted key path (`WAKE_WORD_OPTIONS.ALERT_AUDIO_MAP`)
//! at the moment they are needed, so edits made through [`ConfigStore::set_config`]
//! or [`ConfigStore::reload`] are picked up by the next detection.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::file;
use crate::{Error, Result};

/// Shared, reloadable configuration table
#[derive(Debug, Default)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    table: RwLock<toml::Table>,
}

impl ConfigStore {
    /// Create a store over an in-memory table
    #[must_use]
    pub fn new(table: toml::Table) -> Self {
        Self {
            path: None,
            table: RwLock::new(table),
        }
    }

    /// Open the store backed by a config file
    ///
    /// A missing or unparsable file yields an empty store; [`reload`](Self::reload)
    /// re-reads the same path later.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            table: RwLock::new(file::load_config_table(path)),
        }
    }

    /// Parse a TOML document into a store
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(Self::new(content.parse::<toml::Table>()?))
    }

    /// Path of the backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a value by dotted key path
    #[must_use]
    pub fn get_config(&self, key_path: &str) -> Option<toml::Value> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);

        let mut segments = key_path.split('.');
        let mut current = table.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }

        Some(current.clone())
    }

    /// Look up a boolean flag, falling back to `default` when absent or not a bool
    #[must_use]
    pub fn get_bool(&self, key_path: &str, default: bool) -> bool {
        match self.get_config(key_path) {
            Some(toml::Value::Boolean(b)) => b,
            Some(other) => {
                tracing::debug!(key_path, value = %other, "expected a boolean, using default");
                default
            }
            None => default,
        }
    }

    /// Look up a string value
    #[must_use]
    pub fn get_str(&self, key_path: &str) -> Option<String> {
        match self.get_config(key_path)? {
            toml::Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Set a value by dotted key path, creating intermediate tables
    ///
    /// # Errors
    ///
    /// Returns error if the key path is empty or crosses a non-table value
    pub fn set_config(&self, key_path: &str, value: toml::Value) -> Result<()> {
        let segments: Vec<&str> = key_path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(Error::Config("empty key path".to_string()));
        };
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::Config(format!("invalid key path: {key_path}")));
        }

        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let mut current = &mut *table;
        for segment in parents {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            current = entry.as_table_mut().ok_or_else(|| {
                Error::Config(format!("{segment} in {key_path} is not a table"))
            })?;
        }

        current.insert((*last).to_string(), value);
        Ok(())
    }

    /// Re-read the backing file
    ///
    /// # Errors
    ///
    /// Returns error if the store has no backing file
    pub fn reload(&self) -> Result<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| Error::Config("config store has no backing file".to_string()))?;

        let fresh = file::load_config_table(path);
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        tracing::debug!(path = %path.display(), "config reloaded");
        Ok(())
    }

    /// Copy of the whole table
    #[must_use]
    pub fn snapshot(&self) -> toml::Table {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [WAKE_WORD_OPTIONS]
        ALERT_AUDIO_BLOCKING = true

        [WAKE_WORD_OPTIONS.ALERT_AUDIO_MAP]
        hi = "a.wav"
    "#;

    #[test]
    fn key_path_lookup() {
        let store = ConfigStore::from_toml_str(SAMPLE).unwrap();

        assert!(store.get_bool("WAKE_WORD_OPTIONS.ALERT_AUDIO_BLOCKING", false));
        assert_eq!(
            store.get_str("WAKE_WORD_OPTIONS.ALERT_AUDIO_MAP.hi").as_deref(),
            Some("a.wav")
        );
        assert!(store.get_config("WAKE_WORD_OPTIONS.MISSING").is_none());
        assert!(store.get_config("WAKE_WORD_OPTIONS.ALERT_AUDIO_BLOCKING.deeper").is_none());
    }

    #[test]
    fn non_bool_flag_uses_default() {
        let store = ConfigStore::from_toml_str("FLAG = \"yes\"").unwrap();
        assert!(!store.get_bool("FLAG", false));
        assert!(store.get_bool("ABSENT", true));
    }

    #[test]
    fn set_config_creates_tables() {
        let store = ConfigStore::default();
        store
            .set_config(
                "WAKE_WORD_OPTIONS.ALERT_AUDIO_BLOCKING",
                toml::Value::Boolean(true),
            )
            .unwrap();
        assert!(store.get_bool("WAKE_WORD_OPTIONS.ALERT_AUDIO_BLOCKING", false));
    }

    #[test]
    fn set_config_rejects_scalar_parent() {
        let store = ConfigStore::from_toml_str("A = 1").unwrap();
        assert!(store.set_config("A.B", toml::Value::Integer(2)).is_err());
        assert!(store.set_config("", toml::Value::Integer(2)).is_err());
    }

    #[test]
    fn reload_picks_up_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[WAKE_WORD_OPTIONS]\nALERT_AUDIO_BLOCKING = false\n").unwrap();

        let store = ConfigStore::open(&path);
        assert!(!store.get_bool("WAKE_WORD_OPTIONS.ALERT_AUDIO_BLOCKING", true));

        std::fs::write(&path, "[WAKE_WORD_OPTIONS]\nALERT_AUDIO_BLOCKING = true\n").unwrap();
        store.reload().unwrap();
        assert!(store.get_bool("WAKE_WORD_OPTIONS.ALERT_AUDIO_BLOCKING", false));
    }

    #[test]
    fn reload_without_file_is_an_error() {
        assert!(ConfigStore::default().reload().is_err());
    }
}
