//! Dialogue and dictation state machine
//!
//! Wraps the classifier, arithmetic evaluator and dispatcher into a
//! multi-turn conversation: wake word gating, math follow-ups, dictation
//! mode and session bookkeeping. Every turn produces a [`Response`] for the
//! console and speaker; nothing here performs audio I/O.

mod state;

use std::sync::{MutexGuard, PoisonError};

use crate::arithmetic;
use crate::config::{Config, InputMode};
use crate::dispatch::{Dispatcher, Outcome};
use crate::intent::{Action, Classifier};
use crate::session::{Role, SessionStore, SharedSession};

pub use state::{ConversationContext, DialogueState, contains_word, is_dictation_exit};

/// Farewell spoken before exiting
pub const FAREWELL: &str = "Goodbye!";
/// Notice when input arrives while a voice command is being captured
pub const BUSY: &str = "Already busy.";

const NOT_HEARD: &str = "I didn't catch that.";
const NO_ANSWER: &str = "I don't know the answer yet.";
const DICTATION_STARTED: &str = "Opened Notepad. Dictation mode started. Please dictate what you want me to type. Say 'exit notepad' or 'no' when done.";
const DICTATION_EXITING: &str = "Exiting Notepad dictation mode.";
const DICTATION_ENDED: &str = "Dictation mode ended.";
const TYPE_MORE: &str = "Do you need me to type more?";
const NEXT_LINE: &str = "Dictation Mode: Listening for next line.";
const SESSION_EXPIRED: &str = "Session expired. Conversation cleared.";
const SESSION_CLEARED: &str = "Session cleared.";

/// What one turn produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A transcript line, optionally spoken differently than shown
    Reply {
        /// Line shown in the transcript
        text: String,
        /// Spoken instead of `text` when set
        speech: Option<String>,
    },
    /// Status change only; not recorded or spoken
    Status(String),
    /// Nothing to report
    Silent,
    /// The assistant should say goodbye and quit
    Exit {
        /// Spoken before quitting
        farewell: String,
    },
}

impl Response {
    fn say(text: impl Into<String>) -> Self {
        Self::Reply {
            text: text.into(),
            speech: None,
        }
    }

    /// Transcript text, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Reply { text, .. } => Some(text),
            Self::Exit { farewell } => Some(farewell),
            Self::Status(_) | Self::Silent => None,
        }
    }

    /// Text to hand to the speaker, if any
    #[must_use]
    pub fn speech(&self) -> Option<&str> {
        match self {
            Self::Reply { text, speech } => Some(speech.as_deref().unwrap_or(text)),
            Self::Exit { farewell } => Some(farewell),
            Self::Status(_) | Self::Silent => None,
        }
    }

    /// Whether the assistant should quit
    #[must_use]
    pub const fn is_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }
}

/// A single conversation with the assistant
pub struct Conversation {
    name: String,
    wake_word: String,
    kill_phrases: Vec<String>,
    classifier: Classifier,
    dispatcher: Dispatcher,
    session: SharedSession,
    context: ConversationContext,
    state: DialogueState,
    resting: DialogueState,
}

impl Conversation {
    /// Create a conversation
    ///
    /// Voice input rests waiting for the wake word; text input rests idle.
    #[must_use]
    pub fn new(config: &Config, dispatcher: Dispatcher, session: SharedSession) -> Self {
        let resting = match config.input {
            InputMode::Voice => DialogueState::AwaitingWakeWord,
            InputMode::Text => DialogueState::Idle,
        };

        Self {
            name: config.name.clone(),
            wake_word: config.wake_word.to_lowercase(),
            kill_phrases: config
                .kill_phrases
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            classifier: Classifier::from_config(config),
            dispatcher,
            session,
            context: ConversationContext::default(),
            state: resting,
            resting,
        }
    }

    /// Replace the classifier
    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> DialogueState {
        self.state
    }

    /// Follow-up context
    #[must_use]
    pub const fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Shared session store
    #[must_use]
    pub const fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Greeting spoken at startup
    #[must_use]
    pub fn greeting(&self) -> String {
        let wake = self.wake_word.to_uppercase();
        format!("Hi, I'm {wake}. Say {wake} to wake me up.")
    }

    /// Start listening for a command without the wake word
    ///
    /// Returns false when a command or dictation is already in progress.
    pub fn trigger(&mut self) -> bool {
        if !self.state.accepts_trigger() {
            return false;
        }
        self.transition(DialogueState::Listening);
        true
    }

    /// Return to rest after a capture that could not take place
    pub fn abandon_listening(&mut self) {
        if self.state == DialogueState::Listening {
            self.transition(self.resting);
        }
    }

    /// Handle one voice capture
    pub async fn hear(&mut self, utterance: &str) -> Response {
        match self.state {
            DialogueState::Exited => Response::Silent,
            DialogueState::Idle => {
                tracing::debug!(utterance, "ignoring speech while idle");
                Response::Silent
            }
            DialogueState::AwaitingWakeWord => self.on_wake_mode(utterance).await,
            DialogueState::Listening => self.on_command(utterance).await,
            DialogueState::DictationActive => self.on_dictation(utterance).await,
            DialogueState::AwaitingDictationContinue => self.on_dictation_answer(utterance),
        }
    }

    /// Handle one typed line
    ///
    /// Typed commands skip the wake word; during dictation the line is
    /// dictated instead. While a voice command is being captured the line
    /// is refused.
    pub async fn submit(&mut self, text: &str) -> Response {
        let text = text.trim();
        if text.is_empty() {
            return Response::Silent;
        }

        match self.state {
            DialogueState::Exited => Response::Silent,
            DialogueState::Listening => {
                tracing::debug!(text, "refusing typed input while listening");
                Response::Status(BUSY.to_string())
            }
            DialogueState::DictationActive => self.on_dictation(text).await,
            DialogueState::AwaitingDictationContinue => self.on_dictation_answer(text),
            DialogueState::Idle | DialogueState::AwaitingWakeWord => {
                self.transition(DialogueState::Listening);
                self.on_command(text).await
            }
        }
    }

    /// Clear the session if it has been idle too long
    ///
    /// Returns the notice to show. The dialogue state is left alone, so an
    /// ongoing dictation continues.
    #[must_use]
    pub fn check_expiry(&self) -> Option<String> {
        let mut session = self.lock_session();
        if !session.is_expired() {
            return None;
        }
        session.clear();
        tracing::info!(state = %self.state, "session expired");
        Some(SESSION_EXPIRED.to_string())
    }

    /// Clear the session on request, returning the notice to show
    #[must_use]
    pub fn clear_session(&self) -> String {
        self.lock_session().clear();
        tracing::info!("session cleared");
        SESSION_CLEARED.to_string()
    }

    /// Transcript lines, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock_session()
            .entries()
            .map(|entry| entry.render(&self.name))
            .collect()
    }

    async fn on_wake_mode(&mut self, utterance: &str) -> Response {
        let heard = utterance.to_lowercase();

        if let Some(phrase) = self
            .kill_phrases
            .iter()
            .find(|phrase| contains_phrase(&heard, phrase))
        {
            tracing::info!(phrase = %phrase, "kill phrase heard");
            self.transition(DialogueState::Exited);
            return Response::Exit {
                farewell: FAREWELL.to_string(),
            };
        }

        if !heard.contains(&self.wake_word) {
            return Response::Silent;
        }

        tracing::info!(wake_word = %self.wake_word, "wake word detected");
        self.transition(DialogueState::Listening);

        let command = extract_command(&heard, &self.wake_word);
        if command.is_empty() {
            Response::Status(DialogueState::Listening.label().to_string())
        } else {
            self.on_command(&command).await
        }
    }

    async fn on_command(&mut self, utterance: &str) -> Response {
        let command = utterance.trim();
        if command.is_empty() {
            self.transition(self.resting);
            self.record(Role::Assistant, NOT_HEARD);
            return Response::say(NOT_HEARD);
        }

        self.record(Role::User, command);

        let reply = if let Some(value) = arithmetic::try_evaluate(command) {
            tracing::debug!(value = %value, "evaluated arithmetic");
            let reply = format!("The answer is {value}.");
            self.context.pending_answer = Some(value);
            reply
        } else if arithmetic::is_answer_request(command) {
            self.context
                .pending_answer
                .as_ref()
                .map_or_else(|| NO_ANSWER.to_string(), |v| format!("The answer is {v}."))
        } else {
            let actions = self.classifier.classify(command);
            if *actions.first() == Action::OpenEditorDictation {
                return self.start_dictation().await;
            }

            match self
                .dispatcher
                .dispatch(&actions, &mut self.context.recent)
                .await
            {
                Outcome::Reply(reply) => reply,
                Outcome::Exit => {
                    self.transition(DialogueState::Exited);
                    self.record(Role::Assistant, FAREWELL);
                    return Response::Exit {
                        farewell: FAREWELL.to_string(),
                    };
                }
            }
        };

        self.transition(self.resting);
        self.record(Role::Assistant, &reply);
        Response::say(reply)
    }

    async fn start_dictation(&mut self) -> Response {
        let reply = match self.dispatcher.open_editor().await {
            Ok(()) => {
                self.transition(DialogueState::DictationActive);
                DICTATION_STARTED.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "editor failed to open");
                self.transition(self.resting);
                format!("Could not open Notepad: {e}")
            }
        };

        self.record(Role::Assistant, &reply);
        Response::say(reply)
    }

    async fn on_dictation(&mut self, utterance: &str) -> Response {
        let text = utterance.trim();
        if text.is_empty() {
            return Response::Silent;
        }
        if is_dictation_exit(text) {
            return self.end_dictation();
        }

        let reply = match self.dispatcher.type_into_editor(text).await {
            Ok(()) => format!("Typed: {text}"),
            Err(e) => {
                tracing::warn!(error = %e, "dictation typing failed");
                format!("Could not type in Notepad: {e}")
            }
        };

        self.transition(DialogueState::AwaitingDictationContinue);
        self.record(Role::Assistant, &reply);
        Response::Reply {
            text: reply,
            speech: Some(TYPE_MORE.to_string()),
        }
    }

    fn on_dictation_answer(&mut self, answer: &str) -> Response {
        if is_dictation_exit(answer) {
            return self.end_dictation();
        }
        self.transition(DialogueState::DictationActive);
        Response::Status(NEXT_LINE.to_string())
    }

    fn end_dictation(&mut self) -> Response {
        self.transition(self.resting);
        self.record(Role::Assistant, DICTATION_EXITING);
        Response::Reply {
            text: DICTATION_EXITING.to_string(),
            speech: Some(DICTATION_ENDED.to_string()),
        }
    }

    fn transition(&mut self, next: DialogueState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "dialogue state changed");
            self.state = next;
        }
    }

    fn record(&self, role: Role, text: &str) {
        self.lock_session().add(role, text);
    }

    fn lock_session(&self) -> MutexGuard<'_, SessionStore> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("state", &self.state)
            .field("resting", &self.resting)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Strip everything up to and including the wake word
fn extract_command(transcript: &str, wake_word: &str) -> String {
    transcript.find(wake_word).map_or_else(
        || transcript.to_string(),
        |pos| {
            transcript[pos + wake_word.len()..]
                .trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
                .trim_end()
                .to_string()
        },
    )
}

/// Single words match whole words; longer phrases match anywhere
fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.contains(char::is_whitespace) {
        text.contains(phrase)
    } else {
        contains_word(text, phrase)
    }
}
