//! Shared test utilities

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use wake_cue::plugins::{Plugin, PluginRegistry};
use wake_cue::voice::{AlertPlayer, PlaybackOutcome, PlaybackTier};
use wake_cue::{
    AbortReason, Application, AudioCodec, ChatSink, ConfigStore, ConversationControl, Error,
    Result,
};

/// Shared call log
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Create an empty call log
#[must_use]
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of a call log
#[must_use]
pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Build a config store from TOML text
#[must_use]
pub fn store(toml: &str) -> Arc<ConfigStore> {
    Arc::new(ConfigStore::from_toml_str(toml).expect("valid test config"))
}

/// Codec that records queue clears
pub struct MockCodec {
    pub log: CallLog,
}

#[async_trait]
impl AudioCodec for MockCodec {
    async fn clear_audio_queue(&self) -> Result<()> {
        self.log.lock().unwrap().push("clear_audio_queue".to_string());
        Ok(())
    }
}

/// Audio plugin exposing a [`MockCodec`]
pub struct MockAudioPlugin {
    pub codec: Arc<MockCodec>,
}

#[async_trait]
impl Plugin for MockAudioPlugin {
    fn name(&self) -> &str {
        "audio"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn codec(&self) -> Option<Arc<dyn AudioCodec>> {
        let codec: Arc<dyn AudioCodec> = self.codec.clone();
        Some(codec)
    }
}

/// Host whose capabilities are toggled per test
pub struct MockHost {
    pub log: CallLog,
    pub speaking: AtomicBool,
    pub has_conversation: bool,
    pub has_chat: bool,
    pub fail_abort: bool,
    pub codec: Option<Arc<MockCodec>>,
    pub plugins: PluginRegistry,
}

impl MockHost {
    /// Host with conversation control, an audio plugin and a chat sink
    #[must_use]
    pub fn new(log: &CallLog, speaking: bool) -> Self {
        let codec = Arc::new(MockCodec {
            log: Arc::clone(log),
        });
        let mut plugins = PluginRegistry::new();
        plugins.register(Arc::new(MockAudioPlugin {
            codec: Arc::clone(&codec),
        }));

        Self {
            log: Arc::clone(log),
            speaking: AtomicBool::new(speaking),
            has_conversation: true,
            has_chat: true,
            fail_abort: false,
            codec: Some(codec),
            plugins,
        }
    }

    /// Host that declares no capabilities at all
    #[must_use]
    pub fn bare(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            speaking: AtomicBool::new(false),
            has_conversation: false,
            has_chat: false,
            fail_abort: false,
            codec: None,
            plugins: PluginRegistry::new(),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl ConversationControl for MockHost {
    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    async fn abort_speaking(&self, reason: AbortReason) -> Result<()> {
        self.record(format!("abort_speaking({reason})"));
        if self.fail_abort {
            return Err(Error::Host("abort refused".to_string()));
        }
        self.speaking.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn start_auto_conversation(&self) -> Result<()> {
        self.record("start_auto_conversation");
        Ok(())
    }
}

impl ChatSink for MockHost {
    fn set_chat_message(&self, role: &str, text: &str) {
        self.record(format!("chat {role}: {text}"));
    }
}

impl Application for MockHost {
    fn conversation(&self) -> Option<&dyn ConversationControl> {
        if self.has_conversation {
            Some(self)
        } else {
            None
        }
    }

    fn audio_codec(&self) -> Option<Arc<dyn AudioCodec>> {
        self.codec.as_ref().map(|codec| {
            let codec: Arc<dyn AudioCodec> = codec.clone();
            codec
        })
    }

    fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get_plugin(name)
    }

    fn chat_sink(&self) -> Option<&dyn ChatSink> {
        if self.has_chat { Some(self) } else { None }
    }
}

/// Player that records requests instead of making sound
#[derive(Default)]
pub struct RecordingPlayer {
    pub requests: Mutex<Vec<(String, bool)>>,
}

impl RecordingPlayer {
    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<(String, bool)> {
        self.requests.lock().unwrap().clone()
    }
}

impl AlertPlayer for RecordingPlayer {
    fn play(&self, path: &str, blocking: bool) -> PlaybackOutcome {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), blocking));
        PlaybackOutcome::Played { tier: "recording" }
    }
}

/// Playback tier with a fixed result that counts its calls
pub struct CountingTier {
    pub name: &'static str,
    pub supported: bool,
    pub succeed: bool,
    pub calls: Arc<AtomicUsize>,
}

impl CountingTier {
    /// Boxed tier plus a handle on its call counter
    #[must_use]
    pub fn boxed(
        name: &'static str,
        supported: bool,
        succeed: bool,
    ) -> (Box<dyn PlaybackTier>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let tier = Self {
            name,
            supported,
            succeed,
            calls: Arc::clone(&calls),
        };
        (Box::new(tier), calls)
    }
}

impl PlaybackTier for CountingTier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn play(&self, _path: &Path, _blocking: bool) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(())
        } else {
            Err(Error::Playback(format!("{} failed", self.name)))
        }
    }
}
