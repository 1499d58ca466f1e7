//! Native OS WAV player
//!
//! Shells out to the player every desktop OS ships with: `afplay` on macOS,
//! `aplay` (ALSA) on Linux and `System.Media.SoundPlayer` through PowerShell
//! on Windows.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use super::{PlaybackTier, is_wav};
use crate::{Error, Result};

/// How long a detached player is watched for an early failed exit
const STARTUP_WINDOW: Duration = Duration::from_millis(250);

const STARTUP_POLL: Duration = Duration::from_millis(10);

#[cfg(target_os = "macos")]
const NATIVE_PROGRAM: Option<&str> = Some("afplay");

#[cfg(target_os = "linux")]
const NATIVE_PROGRAM: Option<&str> = Some("aplay");

#[cfg(windows)]
const NATIVE_PROGRAM: Option<&str> = Some("powershell");

#[cfg(not(any(target_os = "macos", target_os = "linux", windows)))]
const NATIVE_PROGRAM: Option<&str> = None;

/// Plays WAV files through the platform's bundled player
#[derive(Debug, Clone, Default)]
pub struct NativePlayer {
    program: Option<PathBuf>,
}

impl NativePlayer {
    /// Locate the platform player on `PATH`
    #[must_use]
    pub fn detect() -> Self {
        let program = NATIVE_PROGRAM.and_then(|name| which::which(name).ok());

        tracing::debug!(program = ?program, "native player lookup");
        Self { program }
    }

    /// Use a specific player binary
    #[must_use]
    pub const fn with_program(program: PathBuf) -> Self {
        Self {
            program: Some(program),
        }
    }

    /// Resolved player binary, if any
    #[must_use]
    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    fn command(program: &Path, path: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(player_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        cmd
    }
}

impl PlaybackTier for NativePlayer {
    fn name(&self) -> &'static str {
        "native"
    }

    fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    fn play(&self, path: &Path, blocking: bool) -> Result<()> {
        let program = self
            .program
            .as_deref()
            .ok_or_else(|| Error::Audio("no native player on this platform".to_string()))?;

        if !is_wav(path) {
            return Err(Error::Audio(format!(
                "native player only handles WAV: {}",
                path.display()
            )));
        }

        let mut cmd = Self::command(program, path);

        if blocking {
            let output = cmd.output()?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(Error::Audio(format!(
                    "{} exited with {}: {}",
                    program.display(),
                    output.status,
                    stderr.trim()
                )));
            }
            return Ok(());
        }

        let mut child = cmd.stderr(Stdio::null()).spawn()?;

        // Watch for an early failed exit so the next tier can run
        let deadline = Instant::now() + STARTUP_WINDOW;
        while Instant::now() < deadline {
            match child.try_wait()? {
                Some(status) if !status.success() => {
                    return Err(Error::Audio(format!(
                        "{} exited with {status}",
                        program.display()
                    )));
                }
                Some(_) => return Ok(()),
                None => std::thread::sleep(STARTUP_POLL),
            }
        }

        // Reap in the background
        std::thread::Builder::new()
            .name("alert-cue-reaper".to_string())
            .spawn(move || match child.wait() {
                Ok(status) if !status.success() => {
                    tracing::warn!(%status, "native player exited with failure");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "failed to wait for native player"),
            })?;

        Ok(())
    }
}

/// Arguments for the platform player
fn player_args(path: &Path) -> Vec<String> {
    let file = path.display().to_string();

    if cfg!(windows) {
        let quoted = file.replace('\'', "''");
        vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            format!("(New-Object Media.SoundPlayer '{quoted}').PlaySync()"),
        ]
    } else if cfg!(target_os = "linux") {
        vec!["-q".to_string(), file]
    } else {
        vec![file]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_unsupported() {
        let player = NativePlayer::default();
        assert!(!player.is_supported());
        assert!(player.play(Path::new("/tmp/a.wav"), true).is_err());
    }

    #[test]
    fn rejects_non_wav() {
        let player = NativePlayer::with_program(PathBuf::from("/bin/true"));
        let err = player.play(Path::new("/tmp/cue.mp3"), true).unwrap_err();
        assert!(err.to_string().contains("WAV"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_args_are_quiet() {
        let args = player_args(Path::new("/tmp/cue.wav"));
        assert_eq!(args, vec!["-q".to_string(), "/tmp/cue.wav".to_string()]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn blocking_reports_player_failure() {
        let player = NativePlayer::with_program(PathBuf::from("/bin/false"));
        assert!(player.play(Path::new("/tmp/cue.wav"), true).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn detached_reports_early_player_failure() {
        let player = NativePlayer::with_program(PathBuf::from("/bin/false"));
        assert!(player.play(Path::new("/tmp/cue.wav"), false).is_err());

        let player = NativePlayer::with_program(PathBuf::from("/bin/true"));
        assert!(player.play(Path::new("/tmp/cue.wav"), false).is_ok());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn blocking_succeeds_when_player_succeeds() {
        let player = NativePlayer::with_program(PathBuf::from("/bin/true"));
        assert!(player.play(Path::new("/tmp/cue.wav"), true).is_ok());
    }
}
