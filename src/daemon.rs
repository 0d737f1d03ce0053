//! Daemon - the assistant's coordinating loop
//!
//! Owns the conversation and multiplexes typed input, voice captures, the
//! session expiry timer and shutdown. Captures run on a worker task and
//! report back over a channel; a busy flag keeps at most one in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::{Config, InputMode};
use crate::dialogue::{BUSY, Conversation, DialogueState, Response};
use crate::dispatch::{Collaborators, Dispatcher};
use crate::session::SessionStore;
use crate::voice::{
    Listener, MicrophoneListener, ProcessSynthesizer, SilentSynthesizer, Speaker, Synthesizer,
    is_capture_error,
};
use crate::Result;

/// Something the coordinating loop must react to
#[derive(Debug)]
enum Event {
    /// A line typed on the console
    Typed(String),
    /// A finished voice capture
    Heard(String),
    /// The console input reached end of file
    InputClosed,
}

/// The assistant daemon
pub struct Daemon {
    config: Config,
    collaborators: Collaborators,
    listener: Arc<dyn Listener>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl Daemon {
    /// Create a daemon backed by the real desktop, microphone and speech program
    ///
    /// `mute` replaces spoken replies with silence.
    #[must_use]
    pub fn new(config: Config, mute: bool) -> Self {
        let collaborators = Collaborators::system(&config);
        let listener: Arc<dyn Listener> = Arc::new(MicrophoneListener::new(&config.voice));
        let synthesizer: Arc<dyn Synthesizer> = if mute {
            Arc::new(SilentSynthesizer)
        } else {
            Arc::new(ProcessSynthesizer::new(config.voice.tts_command.clone()))
        };

        Self::with_parts(config, collaborators, listener, synthesizer)
    }

    /// Create a daemon from explicit collaborators
    #[must_use]
    pub fn with_parts(
        config: Config,
        collaborators: Collaborators,
        listener: Arc<dyn Listener>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            config,
            collaborators,
            listener,
            synthesizer,
        }
    }

    /// Run until exit, kill phrase, end of input or Ctrl-C, reading stdin
    ///
    /// # Errors
    ///
    /// Returns error if the event loop fails
    pub async fn run(self) -> Result<()> {
        self.run_with_input(BufReader::new(tokio::io::stdin())).await
    }

    /// Run with console lines read from `input`
    ///
    /// # Errors
    ///
    /// Returns error if the event loop fails
    #[allow(clippy::too_many_lines)]
    pub async fn run_with_input<R>(self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let Self {
            config,
            collaborators,
            listener,
            synthesizer,
        } = self;

        let voice_mode = config.input == InputMode::Voice;
        tracing::info!(
            name = %config.name,
            input = ?config.input,
            wake_word = %config.wake_word,
            "assistant running"
        );

        let session = SessionStore::from_config(&config.session).shared();
        let dispatcher = Dispatcher::new(collaborators, config.editor.clone());
        let mut conversation = Conversation::new(&config, dispatcher, session);
        let speaker = Speaker::spawn(synthesizer);

        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        spawn_console_reader(input, tx.clone());

        let mut capture = Capture {
            listener,
            events: tx,
            busy: Arc::new(AtomicBool::new(false)),
            mic_failed: false,
            timeout: config.voice.listen_timeout,
            phrase_limit: config.voice.phrase_time_limit,
        };

        let greeting = conversation.greeting();
        if voice_mode {
            println!("{}: {greeting}", config.name);
            speaker.say(greeting);
        } else {
            println!(
                "{} ready. Type a command, or :listen, :clear, :stop, :history.",
                config.name
            );
        }

        // voice mode always captures; text mode only after :listen
        let mut voice_flow = voice_mode;
        if voice_flow {
            capture.start(&speaker);
        }

        let mut expiry = tokio::time::interval(config.session.check_interval);
        // skip the immediate first tick
        expiry.tick().await;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let response = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                _ = expiry.tick() => {
                    if let Some(notice) = conversation.check_expiry() {
                        println!("{notice}");
                    }
                    continue;
                }
                event = rx.recv() => match event {
                    Some(Event::Typed(line)) => {
                        match console_command(&line) {
                            Some(ConsoleCommand::Listen) => {
                                if capture.is_busy() || !conversation.trigger() {
                                    println!("{BUSY}");
                                } else {
                                    println!("[{}]", DialogueState::Listening);
                                    voice_flow = true;
                                    capture.start(&speaker);
                                }
                                continue;
                            }
                            Some(ConsoleCommand::Clear) => {
                                println!("{}", conversation.clear_session());
                                continue;
                            }
                            Some(ConsoleCommand::Stop) => {
                                speaker.stop();
                                continue;
                            }
                            Some(ConsoleCommand::History) => {
                                for line in conversation.history() {
                                    println!("{line}");
                                }
                                continue;
                            }
                            None => conversation.submit(&line).await,
                        }
                    }
                    Some(Event::Heard(text)) => {
                        capture.finished();
                        if is_capture_error(&text) {
                            println!("{text}");
                            capture.mic_failed = true;
                            conversation.abandon_listening();
                            continue;
                        }
                        let response = conversation.hear(&text).await;
                        if !text.is_empty() && response != Response::Silent {
                            println!("You: {text}");
                        }
                        response
                    }
                    Some(Event::InputClosed) => {
                        if voice_mode {
                            tracing::debug!("console input closed");
                            continue;
                        }
                        tracing::info!("input closed");
                        break;
                    }
                    None => break,
                },
            };

            match &response {
                Response::Reply { text, .. } => println!("{}: {text}", config.name),
                Response::Status(status) => println!("[{status}]"),
                Response::Exit { farewell } => println!("{}: {farewell}", config.name),
                Response::Silent => {}
            }
            if let Some(speech) = response.speech() {
                speaker.say(speech);
            }
            if response.is_exit() {
                break;
            }

            if !voice_mode && !conversation.state().expects_speech() {
                voice_flow = false;
            }
            if voice_flow && conversation.state().expects_speech() {
                capture.start(&speaker);
            }
        }

        speaker.finish().await;
        tracing::info!("assistant stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Voice capture worker bookkeeping
struct Capture {
    listener: Arc<dyn Listener>,
    events: mpsc::UnboundedSender<Event>,
    busy: Arc<AtomicBool>,
    mic_failed: bool,
    timeout: std::time::Duration,
    phrase_limit: std::time::Duration,
}

impl Capture {
    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start one capture unless one is already running
    ///
    /// Waits for queued speech to finish so the assistant does not hear itself.
    fn start(&self, speaker: &Speaker) {
        if self.mic_failed {
            tracing::debug!("microphone unavailable, not capturing");
            return;
        }
        if self.busy.swap(true, Ordering::SeqCst) {
            tracing::debug!("capture already in flight");
            return;
        }

        let listener = Arc::clone(&self.listener);
        let events = self.events.clone();
        let idle = speaker.idle();
        let (timeout, phrase_limit) = (self.timeout, self.phrase_limit);

        tokio::spawn(async move {
            idle.await;
            let text = listener.listen(timeout, phrase_limit).await;
            tracing::debug!(text = %text, "capture finished");
            let _ = events.send(Event::Heard(text));
        });
    }

    fn finished(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Console commands standing in for assistant buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleCommand {
    Listen,
    Clear,
    Stop,
    History,
}

fn console_command(line: &str) -> Option<ConsoleCommand> {
    match line.trim() {
        ":listen" => Some(ConsoleCommand::Listen),
        ":clear" => Some(ConsoleCommand::Clear),
        ":stop" => Some(ConsoleCommand::Stop),
        ":history" => Some(ConsoleCommand::History),
        _ => None,
    }
}

fn spawn_console_reader<R>(input: R, events: mpsc::UnboundedSender<Event>)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if events.send(Event::Typed(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = events.send(Event::InputClosed);
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read console input");
                    let _ = events.send(Event::InputClosed);
                    break;
                }
            }
        }
    });
}
