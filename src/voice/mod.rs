//! Voice processing module
//!
//! Handles wake word detection, alert cue lookup and playback, and the
//! reaction that ties them to the host application.

pub mod alert;
pub mod playback;
mod reaction;
mod wake_word;

pub use alert::{AlertAudioMap, resolve};
pub use playback::{
    AlertPlayer, NativePlayer, PlaybackBackend, PlaybackOutcome, PlaybackTier, StreamPlayer,
};
pub use reaction::{ReactionCoordinator, Transition};
pub use wake_word::{
    DetectionCallback, DetectionEvent, DetectorState, ErrorCallback, TranscriptDetector,
    WakeWordDetector,
};
