//! Configuration management for wake-cue

pub mod file;
mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use store::ConfigStore;

use crate::Result;

/// Key path of the keyword → cue file mapping
pub const ALERT_AUDIO_MAP: &str = "WAKE_WORD_OPTIONS.ALERT_AUDIO_MAP";

/// Key path of the "wait for the cue to finish" flag
pub const ALERT_AUDIO_BLOCKING: &str = "WAKE_WORD_OPTIONS.ALERT_AUDIO_BLOCKING";

/// Startup configuration
///
/// Fields here are read once. Anything consulted per detection goes through
/// [`Config::store`] instead.
#[derive(Debug, Clone)]
pub struct Config {
    /// Config file the store was loaded from
    pub config_path: Option<PathBuf>,

    /// Base directory for relative alert cue paths
    /// Set via `WAKECUE_ROOT` env var or `PROJECT_ROOT` in the file
    pub project_root: PathBuf,

    /// Detector configuration
    pub wake_word: WakeWordConfig,

    /// Runtime key-path store shared with the reaction coordinator
    pub store: Arc<ConfigStore>,
}

/// Wake word detector configuration
#[derive(Debug, Clone, Default)]
pub struct WakeWordConfig {
    /// Enable the detector
    pub enabled: bool,

    /// Phrases to listen for
    pub wake_words: Vec<String>,
}

impl Config {
    /// Load configuration from `path`, or the default config file location
    ///
    /// # Errors
    ///
    /// Returns error if the working directory cannot be determined when no
    /// project root is configured
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).or_else(file::config_file_path);

        let store = config_path
            .as_deref()
            .map_or_else(ConfigStore::default, ConfigStore::open);

        Self::from_store(store)
    }

    /// Build configuration from an already populated store
    ///
    /// # Errors
    ///
    /// Returns error if the working directory cannot be determined when no
    /// project root is configured
    pub fn from_store(store: ConfigStore) -> Result<Self> {
        let fc = file::parse_config_file(&store.snapshot());

        // Project root (env > toml > cwd)
        let project_root = match std::env::var("WAKECUE_ROOT").ok().or(fc.project_root) {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir()?,
        };

        let wake_word = WakeWordConfig {
            enabled: fc.wake_word_options.use_wake_word.unwrap_or(false),
            wake_words: fc.wake_word_options.wake_words.unwrap_or_default(),
        };

        if wake_word.enabled && wake_word.wake_words.is_empty() {
            tracing::warn!("USE_WAKE_WORD is set but WAKE_WORDS is empty");
        }

        Ok(Self {
            config_path: store.path().map(Path::to_path_buf),
            project_root,
            wake_word,
            store: Arc::new(store),
        })
    }
}
