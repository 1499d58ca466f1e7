//! Reaction to a detected wake word
//!
//! Each detection runs two stages that fail independently:
//!
//! - **transition**: barge in on the assistant if it is speaking, otherwise
//!   open a new conversational turn
//! - **alert**: look up the configured cue for the wake word and hand it to
//!   the playback backend on the blocking thread pool
//!
//! Overlapping detections are not deduplicated. Two quick detections give
//! two cues with no ordering guarantee between them.

use std::sync::{Arc, Weak};

use crate::config::{ALERT_AUDIO_BLOCKING, ConfigStore};
use crate::host::{AbortReason, Application};
use crate::voice::alert::{self, AlertAudioMap};
use crate::voice::playback::AlertPlayer;
use crate::voice::wake_word::DetectionEvent;
use crate::{Error, Result};

/// Name of the plugin whose codec holds queued output audio
const AUDIO_PLUGIN: &str = "audio";

/// Chat role used when surfacing detector errors
const ASSISTANT_ROLE: &str = "assistant";

/// What the transition stage did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The assistant was speaking and got cut off
    Interrupted,
    /// A new auto conversation was started
    Started,
    /// The host has no conversation capability
    Unsupported,
}

/// Coordinates the host transition and alert cue for each detection
pub struct ReactionCoordinator {
    app: Weak<dyn Application>,
    config: Arc<ConfigStore>,
    player: Arc<dyn AlertPlayer>,
}

impl ReactionCoordinator {
    /// Create a coordinator for `app`
    ///
    /// Only a weak reference to the host is kept; once the host is dropped
    /// the transition stage becomes a no-op.
    #[must_use]
    pub fn new(
        app: &Arc<dyn Application>,
        config: Arc<ConfigStore>,
        player: Arc<dyn AlertPlayer>,
    ) -> Self {
        Self {
            app: Arc::downgrade(app),
            config,
            player,
        }
    }

    /// Handle one detection
    ///
    /// Never fails: each stage logs its own error and the other stage still
    /// runs.
    pub async fn on_detected(&self, event: DetectionEvent) {
        tracing::info!(
            wake_word = event.wake_word.as_deref().unwrap_or_default(),
            "wake word reaction"
        );

        match self.interrupt_or_start().await {
            Ok(transition) => tracing::debug!(?transition, "wake word transition"),
            Err(e) => tracing::error!(error = %e, "failed to handle wake word transition"),
        }

        if let Err(e) = self.play_alert(&event).await {
            tracing::error!(error = %e, "failed to play wake word alert");
        }
    }

    /// Barge in or open a conversation, depending on host state
    ///
    /// # Errors
    ///
    /// Returns error if a host call fails
    pub async fn interrupt_or_start(&self) -> Result<Transition> {
        let Some(app) = self.app.upgrade() else {
            tracing::debug!("host application gone, skipping transition");
            return Ok(Transition::Unsupported);
        };

        let Some(conversation) = app.conversation() else {
            return Ok(Transition::Unsupported);
        };

        if !conversation.is_speaking() {
            conversation.start_auto_conversation().await?;
            return Ok(Transition::Started);
        }

        conversation
            .abort_speaking(AbortReason::WakeWordDetected)
            .await?;

        if let Some(codec) = app.get_plugin(AUDIO_PLUGIN).and_then(|p| p.codec()) {
            codec.clear_audio_queue().await?;
        }

        Ok(Transition::Interrupted)
    }

    /// Resolve and dispatch the alert cue for `event`
    ///
    /// Returns the configured path handed to the player, if any. When
    /// `ALERT_AUDIO_BLOCKING` is set this waits for playback to finish.
    ///
    /// # Errors
    ///
    /// Returns error if a blocking playback task could not be joined
    pub async fn play_alert(&self, event: &DetectionEvent) -> Result<Option<String>> {
        let map = AlertAudioMap::from_config(&self.config);

        if map.is_empty() {
            return Ok(None);
        }

        let blocking = self.config.get_bool(ALERT_AUDIO_BLOCKING, false);

        let Some(path) = alert::resolve(
            event.wake_word.as_deref(),
            event.full_text.as_deref(),
            &map,
        ) else {
            tracing::debug!("no alert cue configured for this wake word");
            return Ok(None);
        };

        if path.is_empty() {
            return Ok(None);
        }

        let path = path.to_string();
        let request = path.clone();
        let player = Arc::clone(&self.player);
        let task = tokio::task::spawn_blocking(move || player.play(&request, blocking));

        if blocking {
            let outcome = task
                .await
                .map_err(|e| Error::Playback(format!("alert playback task failed: {e}")))?;
            tracing::debug!(%outcome, "blocking alert cue finished");
        }

        Ok(Some(path))
    }

    /// Handle an error reported by the detector
    ///
    /// Logged, and shown in the host's chat when it has one.
    pub fn on_error(&self, error: &str) {
        tracing::error!(error, "wake word detector error");

        let Some(app) = self.app.upgrade() else {
            return;
        };
        if let Some(sink) = app.chat_sink() {
            sink.set_chat_message(ASSISTANT_ROLE, &format!("[wake word error] {error}"));
        }
    }
}
