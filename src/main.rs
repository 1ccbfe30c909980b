use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use babel_gateway::{
    AudioPlayback, DeviceKind, DeviceRegistry, MyMemoryClient, Orchestrator, SessionState,
    SettingsStore, UnsupportedRecognizer, VoiceSelector, languages,
    synth::NullSynthesizer,
};

/// Babel - Live speech translation gateway
#[derive(Parser)]
#[command(name = "babel", version, about)]
struct Cli {
    /// Source language tag (the language being spoken)
    #[arg(short, long, env = "BABEL_FROM", default_value = "fr-FR")]
    from: String,

    /// Target language tag (the language to translate into)
    #[arg(short, long, env = "BABEL_TO", default_value = "en-US")]
    to: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an interactive translation session
    Run,
    /// Translate a piece of text and print the result
    Translate {
        /// Text to translate
        text: String,
        /// Also speak the translation
        #[arg(long)]
        speak: bool,
    },
    /// Speak text in the target language
    Speak {
        /// Text to speak
        text: String,
    },
    /// List audio input and output devices
    Devices,
    /// List supported languages
    Languages,
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,babel_gateway=info",
        1 => "info,babel_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
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
    match cli.command {
        Some(Command::Devices) => return cmd_devices(),
        Some(Command::Languages) => return cmd_languages(),
        Some(Command::TestSpeaker) => return cmd_test_speaker().await,
        _ => {}
    }

    let orchestrator = build_orchestrator(&cli.from, &cli.to)?;

    match cli.command {
        Some(Command::Translate { text, speak }) => cmd_translate(&orchestrator, &text, speak).await,
        Some(Command::Speak { text }) => {
            orchestrator.speak_text(&text).await?;
            Ok(())
        }
        Some(Command::Run) | None => cmd_run(orchestrator).await,
        Some(Command::Devices | Command::Languages | Command::TestSpeaker) => unreachable!(),
    }
}

/// Wire the session orchestrator from persisted settings
fn build_orchestrator(from: &str, to: &str) -> anyhow::Result<Orchestrator> {
    let settings = Arc::new(SettingsStore::open_default()?);
    let output_id = settings.get().audio.output_id;

    let playback = Arc::new(AudioPlayback::new(output_id));
    let voices = VoiceSelector::new(
        Arc::clone(&settings),
        Arc::new(NullSynthesizer),
        playback,
    );

    let orchestrator = Orchestrator::new(
        from,
        to,
        Arc::new(DeviceRegistry::new()),
        // No host recognition engine on the command line; sessions fall back
        // to text mode.
        Arc::new(UnsupportedRecognizer),
        Arc::new(MyMemoryClient::new()),
        voices,
        settings,
    )?;

    Ok(orchestrator)
}

/// Live session, or interactive text mode when recognition is unavailable
async fn cmd_run(orchestrator: Orchestrator) -> anyhow::Result<()> {
    let pair = orchestrator.languages();
    println!("Translating {} -> {}", pair.source, pair.target);

    if orchestrator.recognition_supported() {
        orchestrator.start().await?;
        println!("Listening... press Ctrl-C to stop.\n");

        tokio::signal::ctrl_c().await?;
        orchestrator.stop().await;

        let transcript = orchestrator.transcript();
        let translated = orchestrator.translated();
        if !transcript.is_empty() {
            println!("\nHeard:      {transcript}");
            println!("Translated: {translated}");
        }
        debug_assert_eq!(orchestrator.state(), SessionState::Idle);
        return Ok(());
    }

    println!("No speech recognition engine available; using text mode.");
    println!("Type text to translate, or an empty line to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => break,
        };

        let Some(line) = line else { break };
        let text = line.trim();
        if text.is_empty() {
            break;
        }

        let translated = orchestrator.translate_text(text).await;
        if translated.is_empty() {
            println!("(translation unavailable)");
            continue;
        }

        println!("-> {translated}");
        if let Err(e) = orchestrator.speak_text(&translated).await {
            tracing::warn!(error = %e, "voice output failed");
        }
    }

    Ok(())
}

/// One-shot translation
async fn cmd_translate(
    orchestrator: &Orchestrator,
    text: &str,
    speak: bool,
) -> anyhow::Result<()> {
    let translated = orchestrator.translate_text(text).await;
    if translated.is_empty() {
        anyhow::bail!("translation unavailable");
    }

    println!("{translated}");
    if speak {
        orchestrator.speak_text(&translated).await?;
    }
    Ok(())
}

/// List audio endpoints
fn cmd_devices() -> anyhow::Result<()> {
    let registry = DeviceRegistry::new();
    let devices = registry.refresh()?;

    if devices.is_empty() {
        println!("No audio devices found");
        return Ok(());
    }

    for device in devices {
        let kind = match device.kind {
            DeviceKind::Input => "input ",
            DeviceKind::Output => "output",
        };
        println!("{kind}  {}", device.label);
    }
    Ok(())
}

/// List the language catalog
fn cmd_languages() -> anyhow::Result<()> {
    for lang in languages::CATALOG {
        println!("{:8} {}", lang.bcp47, lang.label);
    }
    Ok(())
}

/// Test speaker output with a sine wave
async fn cmd_test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24000_f32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    let playback = AudioPlayback::new(None);
    playback.play_samples(samples).await?;

    println!("If you heard the tone, your speakers are working!");
    Ok(())
}
