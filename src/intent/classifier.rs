//! Rule-based intent classifier
//!
//! Rules are evaluated in a fixed priority order and the first match wins.
//! Unrecognized input always falls back to a language-model query, so every
//! utterance yields exactly one non-empty action sequence.

use super::fuzzy::{self, extract_one};
use super::lemma::{has_lemma, tokenize};
use super::{Action, ActionSequence};
use crate::config::Config;

/// Argument-free command phrases noisy transcriptions are snapped onto
pub const CANONICAL_COMMANDS: &[&str] = &[
    "open youtube",
    "open the first site",
    "open the first video",
    "increase volume",
    "decrease volume",
    "increase brightness",
    "decrease brightness",
    "exit",
    "stop",
];

/// Similarity above which an utterance is replaced by its canonical phrase
const NORMALIZE_THRESHOLD: u8 = 70;

/// Similarity above which an application name is corrected
const APP_MATCH_THRESHOLD: u8 = 60;

/// Web search cues, most specific first
const WEB_SEARCH_CUES: &[&str] = &[
    "search google for",
    "open google and search",
    "google search",
    "search google",
];

/// Video search cues, most specific first
const VIDEO_SEARCH_CUES: &[&str] = &["search youtube for", "youtube search", "search youtube"];

const VOLUME_UP: u8 = 80;
const VOLUME_DOWN: u8 = 30;
const BRIGHTNESS_UP: u8 = 90;
const BRIGHTNESS_DOWN: u8 = 40;

/// Turns utterances into action sequences
#[derive(Debug, Clone)]
pub struct Classifier {
    known_apps: Vec<String>,
    normalize: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Classifier {
    /// Create a classifier
    ///
    /// # Arguments
    ///
    /// * `known_apps` - Application names misheard names are corrected towards
    /// * `normalize` - Snap near-miss utterances onto [`CANONICAL_COMMANDS`]
    #[must_use]
    pub fn new(known_apps: Vec<String>, normalize: bool) -> Self {
        let known_apps = known_apps.into_iter().map(|a| a.to_lowercase()).collect();
        Self {
            known_apps,
            normalize,
        }
    }

    /// Create a classifier from configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.known_apps.clone(), config.normalize_commands)
    }

    /// Application names the matcher corrects towards
    #[must_use]
    pub fn known_apps(&self) -> &[String] {
        &self.known_apps
    }

    /// Classify an utterance
    #[must_use]
    pub fn classify(&self, utterance: &str) -> ActionSequence {
        let mut command = utterance.trim().to_lowercase();

        if self.normalize {
            if let Some(canonical) = normalize_command(&command) {
                tracing::debug!(from = %command, to = canonical, "normalized command");
                command = canonical.to_string();
            }
        }

        let action = self
            .match_rules(&command)
            .unwrap_or_else(|| Action::QueryLlm(utterance.trim().to_string()));

        tracing::debug!(action = action.name(), utterance, "classified");
        ActionSequence::single(action)
    }

    fn match_rules(&self, command: &str) -> Option<Action> {
        let trimmed = command.trim();

        if let Some(query) = extract_after_cue(command, WEB_SEARCH_CUES) {
            return Some(Action::SearchWeb(query));
        }
        if trimmed == "open the first site" {
            return Some(Action::OpenFirstWebResult);
        }
        if let Some(query) = extract_after_cue(command, VIDEO_SEARCH_CUES) {
            return Some(Action::SearchVideo(query));
        }
        if trimmed == "open the first video" {
            return Some(Action::OpenFirstVideo);
        }

        if command.contains("open notepad") {
            for cue in ["type ", "write "] {
                if command.contains(cue) {
                    let text = after(command, cue.trim_end()).trim().trim_matches('"');
                    return Some(Action::OpenAndWriteEditor(text.trim().to_string()));
                }
            }
        }

        if command.contains("open youtube") && command.contains("search") {
            return Some(Action::SearchVideo(after(command, "search").trim().to_string()));
        }

        if command.contains("open notepad") {
            return Some(Action::OpenEditorDictation);
        }

        let tokens = tokenize(command);

        if has_lemma(&tokens, &["open", "launch"]) {
            return Some(self.open_target(command));
        }

        if has_lemma(&tokens, &["create", "make"]) && command.contains("folder") {
            return Some(Action::CreateFolder(after_last(command, "folder").trim().to_string()));
        }

        if command.contains("search") && command.contains("youtube") {
            return Some(Action::SearchVideo(after(command, "search").trim().to_string()));
        }

        let has_word = |word: &str| tokens.iter().any(|t| t.text == word);
        let levels = [
            ("increase", "volume", Action::SetVolume(VOLUME_UP)),
            ("decrease", "volume", Action::SetVolume(VOLUME_DOWN)),
            ("increase", "brightness", Action::AdjustBrightness(BRIGHTNESS_UP)),
            ("decrease", "brightness", Action::AdjustBrightness(BRIGHTNESS_DOWN)),
        ];
        if let Some((_, _, action)) = levels
            .into_iter()
            .find(|(verb, target, _)| has_word(*verb) && has_word(*target))
        {
            return Some(action);
        }

        if matches!(trimmed, "exit" | "stop") {
            return Some(Action::Exit);
        }

        let written = if trimmed == "write" {
            Some("")
        } else {
            trimmed.strip_prefix("write ")
        };
        if let Some(text) = written {
            return Some(Action::OpenAndWriteEditor(text.trim().trim_matches('"').to_string()));
        }

        None
    }

    /// Resolve the target of an open/launch utterance
    fn open_target(&self, command: &str) -> Action {
        if command.contains("notepad") {
            return Action::OpenApplication("notepad".to_string());
        }
        if command.contains("youtube") {
            return Action::OpenWebsite("youtube".to_string());
        }
        if command.contains("google") {
            return Action::OpenWebsite("google".to_string());
        }
        if command.contains("folder") {
            return Action::CreateFolder(after_last(command, "folder").trim().to_string());
        }

        let words: Vec<&str> = command.split_whitespace().collect();
        let idx = words.iter().position(|w| *w == "open").unwrap_or(0);
        let candidate = words.get(idx + 1..).unwrap_or_default().join(" ");

        match extract_one(&candidate, &self.known_apps, fuzzy::weighted_ratio) {
            Some((best, score)) if score > APP_MATCH_THRESHOLD => {
                tracing::debug!(candidate = %candidate, best, score, "matched known application");
                Action::OpenApplication(best.to_string())
            }
            _ => Action::OpenApplication(candidate),
        }
    }
}

/// Snap an utterance onto a canonical command phrase when it is close enough
#[must_use]
pub fn normalize_command(command: &str) -> Option<&'static str> {
    extract_one(command, CANONICAL_COMMANDS, fuzzy::ratio)
        .filter(|(_, score)| *score > NORMALIZE_THRESHOLD)
        .map(|(phrase, _)| phrase)
}

/// Query following the first cue present in `command`
fn extract_after_cue(command: &str, cues: &[&str]) -> Option<String> {
    cues.iter()
        .find(|cue| command.contains(*cue))
        .map(|cue| after(command, cue).trim().to_string())
}

/// Text after the first occurrence of `pat`
fn after<'a>(text: &'a str, pat: &str) -> &'a str {
    text.split_once(pat).map_or("", |(_, rest)| rest)
}

/// Text after the last occurrence of `pat`
fn after_last<'a>(text: &'a str, pat: &str) -> &'a str {
    text.rsplit_once(pat).map_or("", |(_, rest)| rest)
}
