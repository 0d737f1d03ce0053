use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cs2p::arithmetic;
use cs2p::config::InputMode;
use cs2p::intent::Classifier;
use cs2p::voice::{
    AudioCapture, Listener, MicrophoneListener, ProcessSynthesizer, Synthesizer, calculate_energy,
};
use cs2p::{Config, Daemon};

/// CS2P - desktop voice assistant
#[derive(Parser)]
#[command(name = "cs2p", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Input mode: "text" (console) or "voice" (microphone with wake word)
    #[arg(short, long)]
    input: Option<String>,

    /// Print replies without speaking them
    #[arg(long)]
    mute: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the assistant (default)
    Run,
    /// Print the actions an utterance classifies to, as JSON
    Classify {
        /// Utterance to classify
        text: String,
    },
    /// Evaluate an arithmetic utterance ("2+2=", "what is 3 times 4")
    Eval {
        /// Utterance to evaluate
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,cs2p=info",
        1 => "info,cs2p=debug",
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

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let input = cli
        .input
        .as_deref()
        .map(|s| {
            InputMode::parse(s).ok_or_else(|| anyhow::anyhow!("unknown input mode: {s}"))
        })
        .transpose()?;

    let config = Config::load_with_options(input);
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            Daemon::new(config, cli.mute).run().await?;
            Ok(())
        }
        Command::Classify { text } => {
            let actions = Classifier::from_config(&config).classify(&text);
            println!("{}", serde_json::to_string_pretty(&actions)?);
            Ok(())
        }
        Command::Eval { text } => {
            if let Some(value) = arithmetic::try_evaluate(&text) {
                println!("{value}");
            }
            Ok(())
        }
        Command::TestMic { duration } => test_mic(&config, duration).await,
        Command::TestTts { text } => test_tts(&config, &text).await,
    }
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::open()?;
    capture.start()?;

    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();
    drop(capture);

    println!("\n---");
    println!("Now say a short phrase to test recognition...");

    let listener = MicrophoneListener::new(&config.voice);
    let heard = listener
        .listen(config.voice.listen_timeout, config.voice.phrase_time_limit)
        .await;

    if heard.is_empty() {
        println!("Heard nothing. Check OPENAI_API_KEY and your input device.");
    } else {
        println!("Heard: {heard}");
    }

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let synthesizer = ProcessSynthesizer::new(config.voice.tts_command.clone());
    synthesizer.speak(text).await?;

    println!("---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
