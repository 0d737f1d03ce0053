//! Dialogue states and the per-conversation context

use std::fmt;

use crate::dispatch::RecentSearches;

/// Where the conversation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogueState {
    /// Waiting for a typed command or manual trigger
    #[default]
    Idle,
    /// Continuous listening for the wake word
    AwaitingWakeWord,
    /// Next utterance is a command
    Listening,
    /// Next utterance is typed into the editor
    DictationActive,
    /// Asked whether to type more
    AwaitingDictationContinue,
    /// The assistant has been told to quit
    Exited,
}

impl DialogueState {
    /// Short status line for the console
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AwaitingWakeWord => "Waiting for wake word",
            Self::Listening => "Listening...",
            Self::DictationActive => {
                "Dictation Mode: Listening for text to type. Say 'exit notepad' or 'no' to finish."
            }
            Self::AwaitingDictationContinue => "Do you need me to type more? Say yes or no.",
            Self::Exited => "Exited",
        }
    }

    /// Whether the next voice capture belongs to this state
    #[must_use]
    pub const fn expects_speech(self) -> bool {
        matches!(
            self,
            Self::AwaitingWakeWord
                | Self::Listening
                | Self::DictationActive
                | Self::AwaitingDictationContinue
        )
    }

    /// Whether dictation is in progress
    #[must_use]
    pub const fn in_dictation(self) -> bool {
        matches!(self, Self::DictationActive | Self::AwaitingDictationContinue)
    }

    /// Whether new commands may start from here
    #[must_use]
    pub const fn accepts_trigger(self) -> bool {
        matches!(self, Self::Idle | Self::AwaitingWakeWord)
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Follow-up state carried between turns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationContext {
    /// Last arithmetic result, overwritten by each evaluation
    pub pending_answer: Option<String>,
    /// Last search per channel for "open the first ..." follow-ups
    pub recent: RecentSearches,
}

/// Whether a dictated line ends dictation
///
/// "no" must be a whole word; "exit notepad" may appear anywhere.
#[must_use]
pub fn is_dictation_exit(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("exit notepad") || contains_word(&lower, "no")
}

/// Whether `word` occurs in `text` as a whole word
#[must_use]
pub fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|token| token.eq_ignore_ascii_case(word))
}
