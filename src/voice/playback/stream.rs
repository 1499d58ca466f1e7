//! Cross-platform playback to the default output device

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use super::PlaybackTier;
use crate::{Error, Result};

/// Decoded WAV cue, downmixed to mono
#[derive(Debug, Clone)]
pub struct WavClip {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate of the file
    pub sample_rate: u32,
}

impl WavClip {
    /// Decode a WAV file
    ///
    /// # Errors
    ///
    /// Returns error if the file is not a readable WAV container
    #[allow(clippy::cast_precision_loss)]
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| Error::Audio(format!("{}: {e}", path.display())))?;

        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let decoded: std::result::Result<Vec<f32>, hound::Error> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect(),
            hound::SampleFormat::Int => {
                let scale = 2f32.powi(i32::from(spec.bits_per_sample) - 1);
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect()
            }
        };
        let interleaved =
            decoded.map_err(|e| Error::Audio(format!("WAV decode error: {e}")))?;

        // Downmix by averaging channels
        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Playback length
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let samples = u64::try_from(self.samples.len()).unwrap_or(u64::MAX);
        Duration::from_millis(samples.saturating_mul(1000) / u64::from(self.sample_rate))
    }
}

/// Plays WAV files through a `cpal` output stream
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamPlayer;

impl PlaybackTier for StreamPlayer {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn is_supported(&self) -> bool {
        cpal::default_host().default_output_device().is_some()
    }

    fn play(&self, path: &Path, blocking: bool) -> Result<()> {
        let clip = WavClip::open(path)?;
        if clip.samples.is_empty() {
            return Ok(());
        }

        // The stream is not Send, so it lives and dies on its own thread.
        // That thread reports back once the stream is running.
        let (started_tx, started_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("alert-cue-stream".to_string())
            .spawn(move || run_clip(&clip, &started_tx))?;

        started_rx
            .recv()
            .map_err(|_| Error::Audio("playback thread exited before starting".to_string()))??;

        if blocking {
            handle
                .join()
                .map_err(|_| Error::Audio("playback thread panicked".to_string()))?;
        }

        Ok(())
    }
}

/// Stream a clip to completion, signalling `started` once audio is flowing
fn run_clip(clip: &WavClip, started: &mpsc::Sender<Result<()>>) {
    let (stream, finished) = match open_stream(clip) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = started.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = started.send(Err(Error::Audio(e.to_string())));
        return;
    }
    let _ = started.send(Ok(()));

    // Poll for completion with timeout
    let start = Instant::now();
    let timeout = clip.duration() + Duration::from_millis(500);

    while !finished.load(Ordering::Acquire) {
        if start.elapsed() > timeout {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    // Small delay to let the device drain
    std::thread::sleep(Duration::from_millis(100));

    drop(stream);
    tracing::debug!(samples = clip.samples.len(), "alert cue stream complete");
}

fn open_stream(clip: &WavClip) -> Result<(Stream, Arc<AtomicBool>)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

    let rate = SampleRate(clip.sample_rate);
    let supports = |channels: u16| {
        device.supported_output_configs().ok()?.find(|c| {
            c.channels() == channels && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
        })
    };

    // Prefer mono, then stereo
    let supported_config = supports(1)
        .or_else(|| supports(2))
        .ok_or_else(|| {
            Error::Audio(format!(
                "no output config for {} Hz",
                clip.sample_rate
            ))
        })?;

    let config: StreamConfig = supported_config.with_sample_rate(rate).config();
    let channels = usize::from(config.channels);

    tracing::debug!(
        device = %device.name().unwrap_or_default(),
        sample_rate = clip.sample_rate,
        channels,
        "alert cue stream opened"
    );

    let samples = clip.samples.clone();
    let finished = Arc::new(AtomicBool::new(false));
    let finished_cb = Arc::clone(&finished);
    let mut position = 0usize;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(position).copied().unwrap_or_else(|| {
                        finished_cb.store(true, Ordering::Release);
                        0.0
                    });
                    frame.fill(sample);

                    if position < samples.len() {
                        position += 1;
                    }
                }
            },
            |err| {
                tracing::error!(error = %err, "alert cue stream error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    Ok((stream, finished))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, frames: &[Vec<i16>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn decodes_mono_int() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[vec![0], vec![16384], vec![-16384]]);

        let clip = WavClip::open(&path).unwrap();
        assert_eq!(clip.sample_rate, 16000);
        assert_eq!(clip.samples.len(), 3);
        assert!((clip.samples[1] - 0.5).abs() < 1e-4);
        assert!((clip.samples[2] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[vec![16384, 0], vec![-16384, -16384]]);

        let clip = WavClip::open(&path).unwrap();
        assert_eq!(clip.samples.len(), 2);
        assert!((clip.samples[0] - 0.25).abs() < 1e-4);
        assert!((clip.samples[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn rejects_non_wav_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.wav");
        std::fs::write(&path, b"ID3 definitely not riff").unwrap();

        assert!(WavClip::open(&path).is_err());
        assert!(StreamPlayer.play(&path, true).is_err());
    }

    #[test]
    fn clip_duration() {
        let clip = WavClip {
            samples: vec![0.0; 8000],
            sample_rate: 16000,
        };
        assert_eq!(clip.duration(), Duration::from_millis(500));
    }
}
