//! Plugin system for the host application
//!
//! Plugins are registered with a priority; lower priorities are set up and
//! started first and stopped last. A plugin that fails a lifecycle step is
//! logged and skipped, never taking the others down with it.
//!
//! # Example
//!
//! ```rust,ignore
//! use wake_cue::plugins::{PluginRegistry, WakeWordPlugin};
//!
//! let mut registry = PluginRegistry::new();
//! registry.register(Arc::new(WakeWordPlugin::with_detector(detector, store, player)));
//!
//! registry.setup_all(&app).await;
//! registry.start_all().await;
//! ```

mod wake_word;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::host::{Application, AudioCodec};

pub use wake_word::{DetectorFactory, WakeWordPlugin};

/// Default priority for plugins that don't care about ordering
pub const DEFAULT_PRIORITY: i32 = 50;

/// A lifecycle-managed component of the host application
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique name, used for lookup (e.g. "audio", "wake_word")
    fn name(&self) -> &str;

    /// Ordering key, lower runs first
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Bind the plugin to its host
    ///
    /// # Errors
    ///
    /// Returns error if setup fails
    async fn setup(&self, app: Arc<dyn Application>) -> Result<()> {
        let _ = app;
        Ok(())
    }

    /// Begin work
    ///
    /// # Errors
    ///
    /// Returns error if the plugin cannot start
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Pause work
    ///
    /// # Errors
    ///
    /// Returns error if the plugin cannot stop
    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    /// Release everything before the host exits
    ///
    /// # Errors
    ///
    /// Returns error if shutdown fails
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    /// Audio codec owned by this plugin, if it has an active one
    fn codec(&self) -> Option<Arc<dyn AudioCodec>> {
        None
    }
}

/// Information about a registered plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    /// Plugin name
    pub name: String,

    /// Plugin priority
    pub priority: i32,
}

/// Lifecycle step, for logging
#[derive(Debug, Clone, Copy)]
enum Step {
    Setup,
    Start,
    Stop,
    Shutdown,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Registered plugins in priority order
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin
    ///
    /// Plugins with equal priority keep registration order.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let priority = plugin.priority();
        let index = self
            .plugins
            .iter()
            .position(|p| p.priority() > priority)
            .unwrap_or(self.plugins.len());

        tracing::info!(name = plugin.name(), priority, "registering plugin");
        self.plugins.insert(index, plugin);
    }

    /// Get plugin by name
    #[must_use]
    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    /// List all registered plugins in run order
    #[must_use]
    pub fn list(&self) -> Vec<PluginInfo> {
        self.plugins
            .iter()
            .map(|p| PluginInfo {
                name: p.name().to_string(),
                priority: p.priority(),
            })
            .collect()
    }

    /// Number of registered plugins
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugins are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Set up every plugin in priority order
    pub async fn setup_all(&self, app: &Arc<dyn Application>) {
        for plugin in &self.plugins {
            let result = plugin.setup(Arc::clone(app)).await;
            log_step(plugin.as_ref(), Step::Setup, result);
        }
    }

    /// Start every plugin in priority order
    pub async fn start_all(&self) {
        for plugin in &self.plugins {
            log_step(plugin.as_ref(), Step::Start, plugin.start().await);
        }
    }

    /// Stop every plugin in reverse priority order
    pub async fn stop_all(&self) {
        for plugin in self.plugins.iter().rev() {
            log_step(plugin.as_ref(), Step::Stop, plugin.stop().await);
        }
    }

    /// Shut down every plugin in reverse priority order
    pub async fn shutdown_all(&self) {
        for plugin in self.plugins.iter().rev() {
            log_step(plugin.as_ref(), Step::Shutdown, plugin.shutdown().await);
        }
    }
}

fn log_step(plugin: &dyn Plugin, step: Step, result: Result<()>) {
    match result {
        Ok(()) => tracing::debug!(name = plugin.name(), %step, "plugin lifecycle step done"),
        Err(e) => tracing::error!(
            name = plugin.name(),
            %step,
            error = %e,
            "plugin lifecycle step failed"
        ),
    }
}
