//! Wake word plugin
//!
//! Binds a [`WakeWordDetector`] to the host: detections are handed to a
//! [`ReactionCoordinator`] on the tokio runtime, detector errors go to the
//! coordinator's error path. If the detector can't be built, or is switched
//! off in configuration, the plugin quietly does nothing.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use async_trait::async_trait;

use super::Plugin;
use crate::Result;
use crate::config::ConfigStore;
use crate::host::Application;
use crate::voice::{AlertPlayer, DetectionEvent, ReactionCoordinator, WakeWordDetector};

/// Plugin name
const NAME: &str = "wake_word";

/// Runs after the audio plugin (priority 10) so its codec exists
const PRIORITY: i32 = 30;

/// Builds the detector during setup
pub type DetectorFactory = Box<dyn Fn() -> Result<Arc<dyn WakeWordDetector>> + Send + Sync>;

struct Attached {
    app: Weak<dyn Application>,
    detector: Arc<dyn WakeWordDetector>,
    coordinator: Arc<ReactionCoordinator>,
}

/// Plugin wiring wake word detection into the host lifecycle
pub struct WakeWordPlugin {
    factory: DetectorFactory,
    config: Arc<ConfigStore>,
    player: Arc<dyn AlertPlayer>,
    attached: RwLock<Option<Attached>>,
}

impl WakeWordPlugin {
    /// Create a plugin that builds its detector with `factory` during setup
    #[must_use]
    pub fn new(
        factory: DetectorFactory,
        config: Arc<ConfigStore>,
        player: Arc<dyn AlertPlayer>,
    ) -> Self {
        Self {
            factory,
            config,
            player,
            attached: RwLock::new(None),
        }
    }

    /// Create a plugin around an existing detector
    #[must_use]
    pub fn with_detector(
        detector: Arc<dyn WakeWordDetector>,
        config: Arc<ConfigStore>,
        player: Arc<dyn AlertPlayer>,
    ) -> Self {
        Self::new(
            Box::new(move || Ok(Arc::clone(&detector))),
            config,
            player,
        )
    }

    /// Whether setup produced a usable detector
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Coordinator created during setup
    #[must_use]
    pub fn coordinator(&self) -> Option<Arc<ReactionCoordinator>> {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| Arc::clone(&a.coordinator))
    }

    fn detector(&self) -> Option<Arc<dyn WakeWordDetector>> {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| Arc::clone(&a.detector))
    }

    fn host(&self) -> Option<Arc<dyn Application>> {
        self.attached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|a| a.app.upgrade())
    }

    fn detach(&self) {
        self.attached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[async_trait]
impl Plugin for WakeWordPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    async fn setup(&self, app: Arc<dyn Application>) -> Result<()> {
        self.detach();

        let detector = match (self.factory)() {
            Ok(detector) => detector,
            Err(e) => {
                tracing::error!(error = %e, "wake word plugin setup failed, disabling");
                return Ok(());
            }
        };

        if !detector.enabled() {
            tracing::debug!("wake word detection disabled");
            return Ok(());
        }

        // Detector callbacks may arrive on a non-runtime thread
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(error = %e, "wake word plugin needs a tokio runtime, disabling");
                return Ok(());
            }
        };

        let coordinator = Arc::new(ReactionCoordinator::new(
            &app,
            Arc::clone(&self.config),
            Arc::clone(&self.player),
        ));

        let on_detected = Arc::clone(&coordinator);
        detector.on_detected(Arc::new(move |event: DetectionEvent| {
            let coordinator = Arc::clone(&on_detected);
            runtime.spawn(async move {
                coordinator.on_detected(event).await;
            });
        }));

        let on_error = Arc::clone(&coordinator);
        detector.on_error(Arc::new(move |error: String| on_error.on_error(&error)));

        *self.attached.write().unwrap_or_else(PoisonError::into_inner) = Some(Attached {
            app: Arc::downgrade(&app),
            detector,
            coordinator,
        });

        tracing::debug!("wake word plugin ready");
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let Some(detector) = self.detector() else {
            return Ok(());
        };

        let Some(codec) = self.host().and_then(|app| app.audio_codec()) else {
            tracing::warn!("no audio codec available, wake word detection not started");
            return Ok(());
        };

        if let Err(e) = detector.start(codec).await {
            tracing::error!(error = %e, "failed to start wake word detector");
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(detector) = self.detector()
            && let Err(e) = detector.stop().await
        {
            tracing::warn!(error = %e, "failed to stop wake word detector");
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        if let Some(detector) = self.detector()
            && let Err(e) = detector.stop().await
        {
            tracing::warn!(error = %e, "failed to shut down wake word detector");
        }
        Ok(())
    }
}
