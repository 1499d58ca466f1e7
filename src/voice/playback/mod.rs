//! Alert cue playback
//!
//! A cue is played through the first tier that works:
//!
//! 1. the platform's native WAV player ([`NativePlayer`])
//! 2. a `cpal` output stream fed from a `hound` decode ([`StreamPlayer`])
//!
//! If neither works the cue is dropped with a warning. Playback problems are
//! never reported as errors to the caller; [`PlaybackOutcome`] says what
//! happened for logging and tests.

mod native;
mod stream;

use std::path::{Path, PathBuf};

pub use native::NativePlayer;
pub use stream::{StreamPlayer, WavClip};

use crate::Result;

/// One playback mechanism in the fallback chain
pub trait PlaybackTier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this tier can run on this host at all
    fn is_supported(&self) -> bool;

    /// Play the file at `path`
    ///
    /// With `blocking` set, return only once playback has finished.
    /// Otherwise return as soon as playback has been issued.
    ///
    /// # Errors
    ///
    /// Returns error if this tier could not play the file
    fn play(&self, path: &Path, blocking: bool) -> Result<()>;
}

/// Something that can play an alert cue by configured path
pub trait AlertPlayer: Send + Sync {
    /// Play the cue, never failing
    fn play(&self, path: &str, blocking: bool) -> PlaybackOutcome;
}

/// What happened to a playback request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Empty path, nothing to do
    Skipped,
    /// The resolved file does not exist
    Missing(PathBuf),
    /// A tier accepted the cue
    Played {
        /// Name of the tier that played it
        tier: &'static str,
    },
    /// Every tier was unsupported or failed
    Unavailable,
}

impl std::fmt::Display for PlaybackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => write!(f, "skipped (empty path)"),
            Self::Missing(path) => write!(f, "missing file: {}", path.display()),
            Self::Played { tier } => write!(f, "played via {tier}"),
            Self::Unavailable => write!(f, "no playback backend available"),
        }
    }
}

/// Tiered playback backend
pub struct PlaybackBackend {
    project_root: PathBuf,
    tiers: Vec<Box<dyn PlaybackTier>>,
}

impl PlaybackBackend {
    /// Create a backend with the platform's default tiers
    #[must_use]
    pub fn new(project_root: PathBuf) -> Self {
        Self::with_tiers(project_root, default_tiers())
    }

    /// Create a backend with an explicit tier list, tried in order
    #[must_use]
    pub fn with_tiers(project_root: PathBuf, tiers: Vec<Box<dyn PlaybackTier>>) -> Self {
        Self {
            project_root,
            tiers,
        }
    }

    /// Configured tiers in fallback order
    pub fn tiers(&self) -> impl Iterator<Item = &dyn PlaybackTier> {
        self.tiers.iter().map(AsRef::as_ref)
    }

    /// Base directory for relative paths
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Turn a configured cue path into an absolute file path
    ///
    /// `~` is expanded to the home directory and relative paths are joined
    /// onto the project root.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let expanded = expand_home(path);
        if expanded.is_absolute() {
            return expanded;
        }

        let joined = self.project_root.join(expanded);
        std::path::absolute(&joined).unwrap_or(joined)
    }
}

impl AlertPlayer for PlaybackBackend {
    fn play(&self, path: &str, blocking: bool) -> PlaybackOutcome {
        if path.is_empty() {
            tracing::debug!("empty alert cue path, nothing to play");
            return PlaybackOutcome::Skipped;
        }

        let resolved = self.resolve_path(path);
        if !resolved.exists() {
            tracing::warn!(path = %resolved.display(), "alert cue file does not exist");
            return PlaybackOutcome::Missing(resolved);
        }

        for tier in &self.tiers {
            if !tier.is_supported() {
                tracing::debug!(tier = tier.name(), "playback tier not supported here");
                continue;
            }

            match tier.play(&resolved, blocking) {
                Ok(()) => {
                    tracing::debug!(
                        tier = tier.name(),
                        path = %resolved.display(),
                        blocking,
                        "alert cue played"
                    );
                    return PlaybackOutcome::Played { tier: tier.name() };
                }
                Err(e) => {
                    tracing::warn!(
                        tier = tier.name(),
                        path = %resolved.display(),
                        error = %e,
                        "playback tier failed, trying next"
                    );
                }
            }
        }

        tracing::warn!(path = %resolved.display(), "no playback backend available for alert cue");
        PlaybackOutcome::Unavailable
    }
}

/// Default tier chain for this platform
#[must_use]
pub fn default_tiers() -> Vec<Box<dyn PlaybackTier>> {
    vec![Box::new(NativePlayer::detect()), Box::new(StreamPlayer)]
}

/// Expand a leading `~` to the user's home directory
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"))
    };

    match (rest, directories::BaseDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}

/// Whether a file looks like a WAV container by extension
fn is_wav(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}
