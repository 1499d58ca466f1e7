//! TOML configuration file loading
//!
//! Supports `~/.config/wakecue/config.toml` as a persistent config source.
//! All fields are optional. Keys use the upper-case names the host
//! application already stores (`WAKE_WORD_OPTIONS.ALERT_AUDIO_MAP`, ...).

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Typed view of the fields read once at startup
///
/// `ALERT_AUDIO_MAP` is deliberately absent: it is looked up through the
/// [`ConfigStore`](super::ConfigStore) on every detection.
#[derive(Debug, Default, Deserialize)]
pub struct WakeCueConfigFile {
    /// Base directory for relative alert cue paths
    #[serde(rename = "PROJECT_ROOT", default)]
    pub project_root: Option<String>,

    /// Wake word options
    #[serde(rename = "WAKE_WORD_OPTIONS", default)]
    pub wake_word_options: WakeWordFileOptions,
}

/// `[WAKE_WORD_OPTIONS]` table
#[derive(Debug, Default, Deserialize)]
pub struct WakeWordFileOptions {
    /// Enable the wake word detector
    #[serde(rename = "USE_WAKE_WORD")]
    pub use_wake_word: Option<bool>,

    /// Phrases the detector listens for (e.g. "hey orin")
    #[serde(rename = "WAKE_WORDS")]
    pub wake_words: Option<Vec<String>>,
}

/// Load the raw TOML table from `path`
///
/// Returns an empty table if the file doesn't exist or can't be parsed.
pub fn load_config_table(path: &Path) -> toml::Table {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return toml::Table::new();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match content.parse::<toml::Table>() {
            Ok(table) => {
                tracing::info!(path = %path.display(), "loaded config file");
                table
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                toml::Table::new()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            toml::Table::new()
        }
    }
}

/// Interpret a raw table through the typed startup schema
///
/// A table that doesn't fit the schema falls back to defaults.
#[must_use]
pub fn parse_config_file(table: &toml::Table) -> WakeCueConfigFile {
    match toml::Value::Table(table.clone()).try_into() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config file has unexpected shape, using defaults");
            WakeCueConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/wakecue/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("wakecue").join("config.toml"))
}
