//! Alert cue resolution
//!
//! Maps a detected wake word (or the full recognized text) to the local
//! audio file configured for it.

use indexmap::IndexMap;

use crate::config::{ALERT_AUDIO_MAP, ConfigStore};

/// Ordered keyword → cue file mapping
///
/// Iteration follows insertion order, which for a config table is file
/// order. Earlier entries win ties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertAudioMap {
    entries: IndexMap<String, String>,
}

impl AlertAudioMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a config value
    ///
    /// Anything other than a table yields an empty map. Entries with empty
    /// keys or non-string paths are skipped.
    #[must_use]
    pub fn from_value(value: &toml::Value) -> Self {
        let Some(table) = value.as_table() else {
            tracing::warn!(value = %value, "alert audio map is not a table, ignoring");
            return Self::default();
        };

        let mut map = Self::default();
        for (key, path) in table {
            if key.is_empty() {
                continue;
            }
            match path {
                toml::Value::String(path) => map.insert(key.clone(), path.clone()),
                other => {
                    tracing::debug!(key, value = %other, "skipping non-string alert audio entry");
                }
            }
        }

        map
    }

    /// Read the map stored under `WAKE_WORD_OPTIONS.ALERT_AUDIO_MAP`
    #[must_use]
    pub fn from_config(store: &ConfigStore) -> Self {
        store
            .get_config(ALERT_AUDIO_MAP)
            .map(|value| Self::from_value(&value))
            .unwrap_or_default()
    }

    /// Add an entry, keeping the original position if the key exists
    pub fn insert(&mut self, keyword: impl Into<String>, path: impl Into<String>) {
        self.entries.insert(keyword.into(), path.into());
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in match-priority order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AlertAudioMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Pick the cue file for a detection
///
/// An exact keyword match on `wake_word` wins outright. Otherwise the map is
/// walked once in order and the first key found inside `wake_word`, or failing
/// that inside `full_text`, wins. Empty keys never match.
#[must_use]
pub fn resolve<'a>(
    wake_word: Option<&str>,
    full_text: Option<&str>,
    map: &'a AlertAudioMap,
) -> Option<&'a str> {
    if map.is_empty() {
        return None;
    }

    let detected = wake_word.unwrap_or_default();
    let text = full_text.filter(|t| !t.is_empty());

    let keys = || map.iter().filter(|(key, _)| !key.is_empty());

    if let Some((_, path)) = keys().find(|(key, _)| *key == detected) {
        return Some(path);
    }

    keys()
        .find(|(key, _)| detected.contains(key) || text.is_some_and(|t| t.contains(key)))
        .map(|(_, path)| path)
}
