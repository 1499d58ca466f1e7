//! Wake word detection
//!
//! [`WakeWordDetector`] is the seam to whatever acoustic detector the host
//! runs. [`TranscriptDetector`] is a text-driven implementation: it watches
//! recognized transcripts for the configured phrases, which is enough to
//! drive the reaction pipeline without a keyword-spotting model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::config::WakeWordConfig;
use crate::host::AudioCodec;
use crate::{Error, Result};

/// One detector firing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionEvent {
    /// The wake word that fired
    pub wake_word: Option<String>,
    /// Everything the detector heard around it
    pub full_text: Option<String>,
}

impl DetectionEvent {
    /// Create an event with both fields present
    #[must_use]
    pub fn new(wake_word: impl Into<String>, full_text: impl Into<String>) -> Self {
        Self {
            wake_word: Some(wake_word.into()),
            full_text: Some(full_text.into()),
        }
    }
}

/// Called once per detection
pub type DetectionCallback = Arc<dyn Fn(DetectionEvent) + Send + Sync>;

/// Called when the detector hits a runtime error
pub type ErrorCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A wake word detector the plugin can drive
#[async_trait]
pub trait WakeWordDetector: Send + Sync {
    /// Whether detection is switched on in configuration
    fn enabled(&self) -> bool;

    /// Register the detection callback, replacing any previous one
    fn on_detected(&self, callback: DetectionCallback);

    /// Register the error callback, replacing any previous one
    fn on_error(&self, callback: ErrorCallback);

    /// Begin listening on `source`
    ///
    /// # Errors
    ///
    /// Returns error if the detector cannot start
    async fn start(&self, source: Arc<dyn AudioCodec>) -> Result<()>;

    /// Stop listening
    ///
    /// # Errors
    ///
    /// Returns error if the detector fails to shut down cleanly
    async fn stop(&self) -> Result<()>;
}

/// State of the transcript detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Not started, transcripts are ignored
    Stopped,
    /// Watching transcripts for wake words
    Listening,
}

/// Detects wake words in recognized text
pub struct TranscriptDetector {
    wake_words: Vec<String>,
    enabled: bool,
    running: AtomicBool,
    detected: RwLock<Option<DetectionCallback>>,
    errored: RwLock<Option<ErrorCallback>>,
}

impl TranscriptDetector {
    /// Create an enabled detector for `wake_words`
    ///
    /// # Errors
    ///
    /// Returns error if no non-blank wake word is given
    pub fn new(wake_words: Vec<String>) -> Result<Self> {
        let normalized: Vec<String> = wake_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        if normalized.is_empty() {
            return Err(Error::WakeWord("no wake words configured".to_string()));
        }

        tracing::debug!(wake_words = ?normalized, "transcript detector initialized");

        Ok(Self {
            wake_words: normalized,
            enabled: true,
            running: AtomicBool::new(false),
            detected: RwLock::new(None),
            errored: RwLock::new(None),
        })
    }

    /// Create a detector from configuration
    ///
    /// A disabled configuration still yields a detector, reporting
    /// `enabled() == false`.
    ///
    /// # Errors
    ///
    /// Returns error if detection is enabled without any wake words
    pub fn from_config(config: &WakeWordConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self {
                wake_words: Vec::new(),
                enabled: false,
                running: AtomicBool::new(false),
                    detected: RwLock::new(None),
                errored: RwLock::new(None),
            });
        }

        Self::new(config.wake_words.clone())
    }

    /// Check a transcript for a wake word
    ///
    /// Does not fire callbacks; see [`feed`](Self::feed).
    #[must_use]
    pub fn check_wake_word(&self, transcript: &str) -> Option<DetectionEvent> {
        let normalized = transcript.to_lowercase();

        self.wake_words
            .iter()
            .find(|wake_word| normalized.contains(wake_word.as_str()))
            .map(|wake_word| DetectionEvent::new(wake_word.clone(), transcript))
    }

    /// Feed a recognized transcript, firing the detection callback on a match
    ///
    /// Returns true if a wake word was detected.
    pub fn feed(&self, transcript: &str) -> bool {
        if !self.is_listening() {
            tracing::trace!("detector stopped, ignoring transcript");
            return false;
        }

        let Some(event) = self.check_wake_word(transcript) else {
            return false;
        };

        tracing::info!(
            wake_word = event.wake_word.as_deref().unwrap_or_default(),
            transcript,
            "wake word detected"
        );

        let callback = self
            .detected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(event);
        }

        true
    }

    /// Report a runtime error through the error callback
    pub fn report_error(&self, error: impl Into<String>) {
        let error = error.into();
        let callback = self
            .errored
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match callback {
            Some(callback) => callback(error),
            None => tracing::error!(error, "wake word detector error"),
        }
    }

    /// Whether transcripts are being watched
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get current state
    #[must_use]
    pub fn state(&self) -> DetectorState {
        if self.is_listening() {
            DetectorState::Listening
        } else {
            DetectorState::Stopped
        }
    }

    /// Get the configured wake words
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }
}

#[async_trait]
impl WakeWordDetector for TranscriptDetector {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn on_detected(&self, callback: DetectionCallback) {
        *self.detected.write().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    fn on_error(&self, callback: ErrorCallback) {
        *self.errored.write().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    async fn start(&self, _source: Arc<dyn AudioCodec>) -> Result<()> {
        // Transcripts arrive through `feed`, so the audio source is not read
        if !self.enabled {
            return Err(Error::WakeWord("detector is disabled".to_string()));
        }

        self.running.store(true, Ordering::Release);
        tracing::info!(wake_words = ?self.wake_words, "listening for wake word");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::debug!("transcript detector stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    struct NullCodec;

    #[async_trait]
    impl AudioCodec for NullCodec {
        async fn clear_audio_queue(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_wake_word_normalization() {
        let detector =
            TranscriptDetector::new(vec!["  Hey ORIN  ".to_string(), "HELLO".to_string()]).unwrap();
        assert_eq!(detector.wake_words(), &["hey orin", "hello"]);
    }

    #[test]
    fn test_blank_wake_words_rejected() {
        assert!(TranscriptDetector::new(vec!["   ".to_string()]).is_err());
        assert!(TranscriptDetector::new(Vec::new()).is_err());
    }

    #[test]
    fn test_check_wake_word() {
        let detector = TranscriptDetector::new(vec!["hey orin".to_string()]).unwrap();

        assert!(detector.check_wake_word("hello world").is_none());

        let event = detector.check_wake_word("Hey Orin, what's up?").unwrap();
        assert_eq!(event.wake_word.as_deref(), Some("hey orin"));
        assert_eq!(event.full_text.as_deref(), Some("Hey Orin, what's up?"));
    }

    #[test]
    fn test_disabled_config() {
        let detector = TranscriptDetector::from_config(&WakeWordConfig::default()).unwrap();
        assert!(!detector.enabled());

        let enabled_without_words = WakeWordConfig {
            enabled: true,
            wake_words: Vec::new(),
        };
        assert!(TranscriptDetector::from_config(&enabled_without_words).is_err());
    }

    #[tokio::test]
    async fn test_feed_requires_start() {
        let detector = TranscriptDetector::new(vec!["orin".to_string()]).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        detector.on_detected(Arc::new(move |_: DetectionEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(!detector.feed("orin"));
        assert_eq!(detector.state(), DetectorState::Stopped);

        let codec = Arc::new(NullCodec);
        detector.start(codec.clone()).await.unwrap();
        assert_eq!(detector.state(), DetectorState::Listening);
        assert_eq!(Arc::strong_count(&codec), 1);
        assert!(detector.feed("ok orin"));
        assert!(!detector.feed("nothing here"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        detector.stop().await.unwrap();
        assert!(!detector.feed("orin"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_report_error_uses_callback() {
        let detector = TranscriptDetector::new(vec!["orin".to_string()]).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        detector.on_error(Arc::new(move |e: String| sink.lock().unwrap().push(e)));

        detector.report_error("mic unplugged");
        assert_eq!(*seen.lock().unwrap(), vec!["mic unplugged".to_string()]);
    }
}
