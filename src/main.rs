use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use wake_cue::config::ALERT_AUDIO_MAP;
use wake_cue::plugins::{Plugin, PluginRegistry, WakeWordPlugin};
use wake_cue::voice::{
    self, AlertAudioMap, AlertPlayer, PlaybackBackend, PlaybackTier, TranscriptDetector,
};
use wake_cue::{AbortReason, Application, AudioCodec, ChatSink, Config, ConversationControl};

/// wakecue - react to wake words with barge-in and an alert cue
#[derive(Parser)]
#[command(name = "wakecue", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/wakecue/config.toml)
    #[arg(short, long, env = "WAKECUE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch transcripts on stdin for wake words
    ///
    /// Each line is treated as recognized speech. `/speak` pretends the
    /// assistant is talking, `/error <message>` simulates a detector error.
    Listen,
    /// Play an alert cue through the playback tiers
    Play {
        /// Cue file (relative paths resolve against the project root)
        path: String,
        /// Return once playback is issued; the cue may be cut short on exit
        #[arg(long)]
        detach: bool,
    },
    /// Show which alert cue a wake word resolves to
    Resolve {
        /// Detected wake word
        wake_word: String,
        /// Full recognized text
        #[arg(short, long)]
        text: Option<String>,
    },
    /// List playback tiers and whether they work here
    Tiers,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,wake_cue=info",
        1 => "info,wake_cue=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => listen(config).await,
        Command::Play { path, detach } => play(&config, path, !detach).await,
        Command::Resolve { wake_word, text } => {
            resolve(&config, &wake_word, text.as_deref());
            Ok(())
        }
        Command::Tiers => {
            tiers(&config);
            Ok(())
        }
    }
}

/// Run the wake word plugin against transcripts read from stdin
async fn listen(config: Config) -> anyhow::Result<()> {
    let detector = Arc::new(TranscriptDetector::from_config(&config.wake_word)?);
    let player: Arc<dyn AlertPlayer> = Arc::new(PlaybackBackend::new(config.project_root.clone()));
    let codec = Arc::new(ConsoleCodec);

    let mut plugins = PluginRegistry::new();
    plugins.register(Arc::new(AudioPlugin {
        codec: Arc::clone(&codec),
    }));
    plugins.register(Arc::new(WakeWordPlugin::with_detector(
        detector.clone(),
        Arc::clone(&config.store),
        player,
    )));

    let host = Arc::new(ConsoleHost {
        speaking: AtomicBool::new(false),
        codec,
        plugins,
    });
    let app: Arc<dyn Application> = host.clone();

    host.plugins.setup_all(&app).await;
    host.plugins.start_all().await;

    if detector.is_listening() {
        println!("Type what the microphone heard. Say one of {:?}.", detector.wake_words());
    } else {
        tracing::warn!("wake word detection is off (set WAKE_WORD_OPTIONS.USE_WAKE_WORD = true)");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                handle_line(&host, &detector, line.trim());
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    host.plugins.stop_all().await;
    host.plugins.shutdown_all().await;
    Ok(())
}

fn handle_line(host: &ConsoleHost, detector: &TranscriptDetector, line: &str) {
    if line.is_empty() {
        return;
    }

    if line == "/speak" {
        host.speaking.store(true, Ordering::SeqCst);
        println!("[host] assistant is speaking");
        return;
    }

    if let Some(message) = line.strip_prefix("/error") {
        detector.report_error(message.trim());
        return;
    }

    if !detector.feed(line) {
        tracing::debug!(line, "no wake word in transcript");
    }
}

/// Play one cue file
async fn play(config: &Config, path: String, blocking: bool) -> anyhow::Result<()> {
    let backend = PlaybackBackend::new(config.project_root.clone());
    let outcome = tokio::task::spawn_blocking(move || backend.play(&path, blocking)).await?;
    println!("{outcome}");
    Ok(())
}

/// Print the cue a wake word resolves to
fn resolve(config: &Config, wake_word: &str, text: Option<&str>) {
    let map = AlertAudioMap::from_config(&config.store);

    if map.is_empty() {
        println!("No alert cues configured ({ALERT_AUDIO_MAP} is empty)");
        return;
    }

    match voice::resolve(Some(wake_word), text, &map) {
        Some(path) => {
            let backend = PlaybackBackend::with_tiers(config.project_root.clone(), Vec::new());
            let resolved = backend.resolve_path(path);
            let state = if resolved.exists() { "exists" } else { "missing" };
            println!("{path} -> {} ({state})", resolved.display());
        }
        None => println!("No alert cue matches \"{wake_word}\""),
    }
}

/// Print the playback tiers in fallback order
fn tiers(config: &Config) {
    let backend = PlaybackBackend::new(config.project_root.clone());
    for (i, tier) in backend.tiers().enumerate() {
        let status = if tier.is_supported() {
            "available"
        } else {
            "unavailable"
        };
        println!("{}. {} ({status})", i + 1, tier.name());
    }
}

/// Host that prints its state transitions
struct ConsoleHost {
    speaking: AtomicBool,
    codec: Arc<ConsoleCodec>,
    plugins: PluginRegistry,
}

#[async_trait]
impl ConversationControl for ConsoleHost {
    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    async fn abort_speaking(&self, reason: AbortReason) -> wake_cue::Result<()> {
        self.speaking.store(false, Ordering::SeqCst);
        println!("[host] stopped speaking ({reason})");
        Ok(())
    }

    async fn start_auto_conversation(&self) -> wake_cue::Result<()> {
        println!("[host] listening for a request");
        Ok(())
    }
}

impl ChatSink for ConsoleHost {
    fn set_chat_message(&self, role: &str, text: &str) {
        println!("{role}: {text}");
    }
}

impl Application for ConsoleHost {
    fn conversation(&self) -> Option<&dyn ConversationControl> {
        Some(self)
    }

    fn audio_codec(&self) -> Option<Arc<dyn AudioCodec>> {
        let codec: Arc<dyn AudioCodec> = self.codec.clone();
        Some(codec)
    }

    fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get_plugin(name)
    }

    fn chat_sink(&self) -> Option<&dyn ChatSink> {
        Some(self)
    }
}

/// Codec stand-in: there is no real output queue in the console
struct ConsoleCodec;

#[async_trait]
impl AudioCodec for ConsoleCodec {
    async fn clear_audio_queue(&self) -> wake_cue::Result<()> {
        tracing::info!("cleared queued output audio");
        Ok(())
    }
}

/// Audio plugin exposing the console codec
struct AudioPlugin {
    codec: Arc<ConsoleCodec>,
}

#[async_trait]
impl Plugin for AudioPlugin {
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
