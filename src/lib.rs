//! wake-cue - reaction pipeline for wake word detections
//!
//! When the detector hears a wake word this crate:
//! - barges in on the assistant if it is speaking, or opens a new turn
//! - looks up the alert cue configured for that wake word and plays it
//!   through a tiered playback backend
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 WakeWordDetector                     │
//! └───────────────────────┬──────────────────────────────┘
//!                         │ (wake_word, full_text)
//! ┌───────────────────────▼──────────────────────────────┐
//! │      WakeWordPlugin → ReactionCoordinator            │
//! └───────────┬───────────────────────────┬──────────────┘
//!             │                           │
//! ┌───────────▼─────────────┐ ┌───────────▼──────────────┐
//! │  Application (host)     │ │ resolve → PlaybackBackend│
//! │  abort / start turn     │ │ native │ cpal │ none     │
//! └─────────────────────────┘ └──────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod plugins;
pub mod voice;

pub use config::{Config, ConfigStore};
pub use error::{Error, Result};
pub use host::{AbortReason, Application, AudioCodec, ChatSink, ConversationControl};
pub use plugins::{Plugin, PluginRegistry, WakeWordPlugin};
pub use voice::{
    AlertAudioMap, AlertPlayer, DetectionEvent, PlaybackBackend, PlaybackOutcome,
    ReactionCoordinator, TranscriptDetector, Transition, WakeWordDetector,
};
