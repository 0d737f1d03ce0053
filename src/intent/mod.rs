//! Intent model and classification
//!
//! Turns a (possibly noisy) transcribed utterance into the ordered list of
//! actions the dispatcher should perform. Classification is a pure function
//! of the text: no I/O happens here.

mod classifier;
pub mod fuzzy;
pub mod lemma;

use serde::Serialize;

pub use classifier::{CANONICAL_COMMANDS, Classifier};

/// A single recognized action with its argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "argument", rename_all = "snake_case")]
pub enum Action {
    /// Open a web search for the query
    SearchWeb(String),
    /// Open the first organic result of the last web search
    OpenFirstWebResult,
    /// Open a video search for the query
    SearchVideo(String),
    /// Open the first video of the last video search
    OpenFirstVideo,
    /// Open the editor and type the text
    OpenAndWriteEditor(String),
    /// Open an empty editor and enter dictation mode
    OpenEditorDictation,
    /// Launch an application by (matched or verbatim) name
    OpenApplication(String),
    /// Open a website by short name ("youtube")
    OpenWebsite(String),
    /// Create a directory
    CreateFolder(String),
    /// Set output volume to an absolute level (0-100)
    SetVolume(u8),
    /// Set screen brightness to an absolute level (0-100)
    AdjustBrightness(u8),
    /// End the assistant
    Exit,
    /// Ask the local language model
    QueryLlm(String),
}

impl Action {
    /// Stable snake-case name for logging
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SearchWeb(_) => "search_web",
            Self::OpenFirstWebResult => "open_first_web_result",
            Self::SearchVideo(_) => "search_video",
            Self::OpenFirstVideo => "open_first_video",
            Self::OpenAndWriteEditor(_) => "open_and_write_editor",
            Self::OpenEditorDictation => "open_notepad_dictation",
            Self::OpenApplication(_) => "open_application",
            Self::OpenWebsite(_) => "open_website",
            Self::CreateFolder(_) => "create_folder",
            Self::SetVolume(_) => "set_volume",
            Self::AdjustBrightness(_) => "adjust_brightness",
            Self::Exit => "exit",
            Self::QueryLlm(_) => "query_llm",
        }
    }
}

/// Ordered, non-empty list of actions produced from one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActionSequence(Vec<Action>);

impl ActionSequence {
    /// Sequence containing exactly one action
    #[must_use]
    pub fn single(action: Action) -> Self {
        Self(vec![action])
    }

    /// Sequence of a first action followed by more
    #[must_use]
    pub fn new(first: Action, rest: impl IntoIterator<Item = Action>) -> Self {
        let mut actions = vec![first];
        actions.extend(rest);
        Self(actions)
    }

    /// The first action (always present)
    #[must_use]
    pub fn first(&self) -> &Action {
        &self.0[0]
    }

    /// Number of actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; sequences are never empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate actions in order
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ActionSequence {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
