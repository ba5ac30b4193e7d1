use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use voxplay::command::{CommandGrammar, CommandId};
use voxplay::config::{BackendChoice, Config};
use voxplay::control::RecordingPlayer;
use voxplay::locale::Language;
use voxplay::orchestrator::{VoiceController, VoiceOutcome};
use voxplay::recognition::{ListenMode, SessionUpdate, SimulatedBackend, parse_script};
use voxplay::source;
use voxplay::store::{self, JsonFileStore, SettingsStore, VoiceSettings};

/// Stop a simulated continuous session after this long without progress
const SIMULATE_IDLE: Duration = Duration::from_secs(2);
const SAMPLE_URL: &str = "https://example.com/sample.mp4";

#[derive(Parser)]
#[command(name = "voxplay", about = "Voice control for video playback")]
struct Cli {
    /// Config file (default: ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a video URL and print its playable reference
    Classify { url: String },

    /// Match a transcript against custom and built-in phrases
    Match { text: String },

    /// List every command with its phrases
    Commands {
        /// UI language code (default: from config)
        #[arg(long)]
        lang: Option<String>,
    },

    /// Bind a custom trigger phrase to a command
    Bind { command: String, phrase: String },

    /// Remove a custom trigger (or all of them)
    Unbind {
        command: Option<String>,
        #[arg(long, conflicts_with = "command")]
        all: bool,
    },

    /// Show or set the confidence threshold
    Threshold { value: Option<f32> },

    /// Run a recognition script through the full voice pipeline
    Simulate {
        script: PathBuf,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        continuous: bool,
    },

    /// Listen on the microphone (requires the `native` feature)
    #[cfg(feature = "native")]
    Listen {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        continuous: bool,
    },
}

fn main() -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();
    let (config, diagnostic) = match &cli.config {
        Some(path) => (Config::from_path(path)?, None),
        None => Config::load(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = diagnostic {
        tracing::warn!("{}, using defaults", e);
    }

    match cli.command {
        Command::Classify { url } => classify(&url),
        Command::Match { text } => match_text(&config, &text),
        Command::Commands { lang } => {
            let language = lang
                .map(|code| Language::from_code(&code))
                .unwrap_or_else(|| config.language());
            let store = open_store(&config)?;
            print!("{}", grammar(&config, store.as_ref()).help(language));
            Ok(())
        }
        Command::Bind { command, phrase } => bind(&config, &command, &phrase),
        Command::Unbind { command, all } => unbind(&config, command.as_deref(), all),
        Command::Threshold { value } => threshold(&config, value),
        Command::Simulate {
            script,
            url,
            continuous,
        } => simulate(&config, &script, url.as_deref(), continuous).await,
        #[cfg(feature = "native")]
        Command::Listen { url, continuous } => listen(&config, url.as_deref(), continuous).await,
    }
}

// ============================================================================
// Offline commands
// ============================================================================

fn classify(url: &str) -> Result<()> {
    let descriptor = source::classify(url);
    let output = match source::to_playable_reference(url) {
        Ok(reference) => json!({
            "descriptor": descriptor,
            "reference": reference,
            "embedUrl": reference.embed_url(),
            "quality": source::optimal_quality(url),
        }),
        Err(e) => json!({ "descriptor": descriptor, "error": e.to_string() }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn open_store(config: &Config) -> Result<Box<dyn SettingsStore>> {
    let path = config.storage.resolved_settings_path();
    let store = JsonFileStore::open(&path)
        .with_context(|| format!("Failed to open settings at {}", path.display()))?;
    Ok(Box::new(store))
}

/// Configured grammar with the persisted overlay applied
fn grammar(config: &Config, store: &dyn SettingsStore) -> CommandGrammar {
    let overlay = VoiceSettings::load(store)
        .custom_commands
        .unwrap_or_else(|| config.commands.overlay());
    CommandGrammar::new(overlay).with_builtin(config.commands.enable_builtin)
}

fn match_text(config: &Config, text: &str) -> Result<()> {
    let store = open_store(config)?;
    match grammar(config, store.as_ref()).matches(text) {
        Some(found) => println!("{} ({:?})", found.command, found.source),
        None => println!("unrecognized: {}", text.trim()),
    }
    Ok(())
}

fn bind(config: &Config, command: &str, phrase: &str) -> Result<()> {
    let id: CommandId = command.parse().map_err(anyhow::Error::msg)?;
    let phrase = phrase.trim();
    anyhow::ensure!(!phrase.is_empty(), "trigger phrase must not be empty");

    let store = open_store(config)?;
    let mut grammar = grammar(config, store.as_ref());
    grammar.overlay_mut().set(id, phrase);
    store::save_custom_commands(store.as_ref(), grammar.overlay())?;
    println!("{} <- \"{}\"", id, phrase);
    Ok(())
}

fn unbind(config: &Config, command: Option<&str>, all: bool) -> Result<()> {
    let store = open_store(config)?;
    let mut grammar = grammar(config, store.as_ref());
    if all {
        grammar.overlay_mut().clear();
        println!("cleared all custom commands");
    } else {
        let command = command.context("give a command id or --all")?;
        let id: CommandId = command.parse().map_err(anyhow::Error::msg)?;
        match grammar.overlay_mut().remove(id) {
            Some(trigger) => println!("{} no longer bound to \"{}\"", id, trigger),
            None => println!("{} has no custom trigger", id),
        }
    }
    store::save_custom_commands(store.as_ref(), grammar.overlay())?;
    Ok(())
}

fn threshold(config: &Config, value: Option<f32>) -> Result<()> {
    let store = open_store(config)?;
    match value {
        Some(value) => {
            store::save_confidence_threshold(store.as_ref(), value)?;
            println!("confidence threshold: {:.2}", value.clamp(0.0, 1.0));
        }
        None => {
            let current = VoiceSettings::load(store.as_ref())
                .confidence_threshold
                .unwrap_or(config.recognition.confidence_threshold);
            println!("confidence threshold: {:.2}", current);
        }
    }
    Ok(())
}

// ============================================================================
// Voice sessions
// ============================================================================

async fn simulate(
    config: &Config,
    script: &Path,
    url: Option<&str>,
    continuous: bool,
) -> Result<()> {
    if config.recognition.backend != BackendChoice::Simulated {
        tracing::info!("simulate always uses the scripted engine");
    }
    let content = fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let batches = parse_script(&content).map_err(anyhow::Error::msg)?;
    let backend = SimulatedBackend::with_script(batches);
    let handle = backend.handle();

    let mut controller = VoiceController::from_config(config, Box::new(backend), open_store(config)?);
    let mut player = RecordingPlayer::new();
    load_video(&mut player, url.unwrap_or(SAMPLE_URL))?;

    let mode = if continuous {
        ListenMode::Continuous
    } else {
        ListenMode::SingleShot
    };
    drive(&mut controller, &mut player, mode).await;

    if handle.remaining_batches() > 0 {
        println!("{} scripted batches never played", handle.remaining_batches());
    }
    Ok(())
}

#[cfg(feature = "native")]
async fn listen(config: &Config, url: Option<&str>, continuous: bool) -> Result<()> {
    use voxplay::recognition::native::NativeBackend;

    let backend = NativeBackend::new(config.recognition.native.clone());
    let mut controller = VoiceController::from_config(config, Box::new(backend), open_store(config)?);
    let mut player = RecordingPlayer::new();
    load_video(&mut player, url.unwrap_or(SAMPLE_URL))?;

    let mode = if continuous {
        ListenMode::Continuous
    } else {
        ListenMode::SingleShot
    };
    let result = controller.execute_control_flow(mode).await;
    println!("{}", result.message);
    if !result.success {
        return Ok(());
    }
    loop {
        tokio::select! {
            outcome = controller.next_outcome(&mut player) => match outcome {
                Some(outcome) => report(&outcome),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                controller.stop().await;
            }
        }
    }
    Ok(())
}

fn load_video(player: &mut RecordingPlayer, url: &str) -> Result<()> {
    let descriptor = player.load(url)?;
    println!(
        "loaded {} [{} / {}]",
        url, descriptor.platform, descriptor.tier
    );
    Ok(())
}

async fn drive(controller: &mut VoiceController, player: &mut RecordingPlayer, mode: ListenMode) {
    let result = controller.execute_control_flow(mode).await;
    println!("{}", result.message);
    if !result.success {
        return;
    }

    loop {
        match tokio::time::timeout(SIMULATE_IDLE, controller.next_outcome(player)).await {
            Ok(Some(outcome)) => report(&outcome),
            Ok(None) => break,
            Err(_) => {
                if !controller.stop().await {
                    break;
                }
            }
        }
    }

    println!(
        "player: playing={} position={:.0}s speed={} fullscreen={} favorite={} bookmarks={}",
        player.is_playing(),
        player.position_secs(),
        player.speed(),
        player.is_fullscreen(),
        player.is_favorite(),
        player.bookmarks().len()
    );
}

fn report(outcome: &VoiceOutcome) {
    match outcome {
        VoiceOutcome::Command { transcript, result } => {
            let mark = if result.success { "ok" } else { "--" };
            println!(
                "[{}] \"{}\" ({:.0}%): {}",
                mark,
                transcript.text,
                transcript.confidence * 100.0,
                result.message
            );
        }
        VoiceOutcome::Update(update) => match update {
            SessionUpdate::Listening { session, mode } => {
                println!("listening {} ({})", session, mode)
            }
            SessionUpdate::Partial(t) => println!("  ... {}", t.text),
            SessionUpdate::Transcript(t) => println!("heard \"{}\"", t.text),
            SessionUpdate::LowConfidence { transcript, .. } => println!(
                "\"{}\": {}",
                transcript.text,
                SessionUpdate::low_confidence_hint(transcript.confidence)
            ),
            SessionUpdate::Transient(e) => println!("{}", e),
            SessionUpdate::Retrying { attempt, max, after } => {
                println!("retrying ({}/{}) in {}ms", attempt, max, after.as_millis())
            }
            SessionUpdate::Failed(e) => println!("error: {}", e),
            SessionUpdate::Ended(reason) => println!("ended: {:?}", reason),
        },
    }
}
