//! Host application capabilities
//!
//! The reaction pipeline never probes the host at runtime. A host declares
//! what it supports by returning `Some` from the accessors on [`Application`];
//! anything left at the default `None` turns the matching behavior into a
//! no-op.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::plugins::Plugin;

/// Why the host was asked to stop speaking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// No particular reason given
    None,
    /// A wake word was heard while the assistant was talking
    WakeWordDetected,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::WakeWordDetected => write!(f, "wake_word_detected"),
        }
    }
}

/// Conversation/device state machine of the host
#[async_trait]
pub trait ConversationControl: Send + Sync {
    /// Whether the assistant is currently producing speech
    fn is_speaking(&self) -> bool;

    /// Stop the current utterance
    ///
    /// # Errors
    ///
    /// Returns error if the host fails to abort
    async fn abort_speaking(&self, reason: AbortReason) -> Result<()>;

    /// Open a new conversational turn
    ///
    /// # Errors
    ///
    /// Returns error if the host fails to start listening
    async fn start_auto_conversation(&self) -> Result<()>;
}

/// Audio codec owned by the host's audio plugin
#[async_trait]
pub trait AudioCodec: Send + Sync {
    /// Drop any audio queued for output
    ///
    /// # Errors
    ///
    /// Returns error if the queue cannot be cleared
    async fn clear_audio_queue(&self) -> Result<()>;
}

/// User-visible chat transcript
pub trait ChatSink: Send + Sync {
    /// Append a message to the transcript
    fn set_chat_message(&self, role: &str, text: &str);
}

/// The host application the pipeline is embedded in
pub trait Application: Send + Sync {
    /// Conversation state machine, if the host supports auto conversation
    fn conversation(&self) -> Option<&dyn ConversationControl> {
        None
    }

    /// Audio source handed to the detector on start
    fn audio_codec(&self) -> Option<Arc<dyn AudioCodec>> {
        None
    }

    /// Registered plugin by name
    fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        let _ = name;
        None
    }

    /// Chat transcript for surfacing errors to the user
    fn chat_sink(&self) -> Option<&dyn ChatSink> {
        None
    }
}
