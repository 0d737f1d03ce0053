//! Action dispatcher
//!
//! Performs each classified action against the OS collaborators and turns
//! the outcome into a short status sentence. Collaborator failures become
//! part of the reply; dispatch itself never fails.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, EditorConfig};
use crate::intent::{Action, ActionSequence};
use crate::llm::{LanguageModel, OllamaClient};
use crate::platform::{
    Automation, Browser, Controls, Filesystem, LocalFilesystem, SystemAutomation, SystemBrowser,
    SystemControls, executable_for,
};
use crate::scrape::{self, HttpResultFinder, ResultFinder};
use crate::Result;

/// Time given to a freshly launched editor before typing into it
const EDITOR_SETTLE: Duration = Duration::from_millis(1500);

/// External services the dispatcher drives
#[derive(Clone)]
pub struct Collaborators {
    /// Opens URLs
    pub browser: Arc<dyn Browser>,
    /// Launches programs and types text
    pub automation: Arc<dyn Automation>,
    /// Volume and brightness
    pub controls: Arc<dyn Controls>,
    /// Folder creation
    pub filesystem: Arc<dyn Filesystem>,
    /// Local language model
    pub llm: Arc<dyn LanguageModel>,
    /// First-result lookups for recent searches
    pub results: Arc<dyn ResultFinder>,
}

impl Collaborators {
    /// Collaborators backed by the real desktop and network
    #[must_use]
    pub fn system(config: &Config) -> Self {
        Self {
            browser: Arc::new(SystemBrowser::new()),
            automation: Arc::new(SystemAutomation::new()),
            controls: Arc::new(SystemControls::new()),
            filesystem: Arc::new(LocalFilesystem::current_dir()),
            llm: Arc::new(OllamaClient::new(&config.llm)),
            results: Arc::new(HttpResultFinder::default()),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Most recent search URL per channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentSearches {
    /// Last web search URL
    pub web: Option<String>,
    /// Last video search URL
    pub video: Option<String>,
}

/// Result of dispatching a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Status sentences, space-joined
    Reply(String),
    /// The user asked to end the assistant
    Exit,
}

/// Routes actions to collaborators
#[derive(Debug, Clone)]
pub struct Dispatcher {
    collaborators: Collaborators,
    editor: EditorConfig,
    editor_settle: Duration,
}

impl Dispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(collaborators: Collaborators, editor: EditorConfig) -> Self {
        Self {
            collaborators,
            editor,
            editor_settle: EDITOR_SETTLE,
        }
    }

    /// Override the pause between launching the editor and typing
    #[must_use]
    pub fn with_editor_settle(mut self, settle: Duration) -> Self {
        self.editor_settle = settle;
        self
    }

    /// Editor configuration
    #[must_use]
    pub const fn editor(&self) -> &EditorConfig {
        &self.editor
    }

    /// Perform every action in order
    ///
    /// An exit action ends processing immediately; replies of earlier
    /// actions are dropped.
    pub async fn dispatch(&self, actions: &ActionSequence, recent: &mut RecentSearches) -> Outcome {
        let mut replies = Vec::with_capacity(actions.len());

        for action in actions {
            tracing::info!(action = action.name(), "dispatching");
            if *action == Action::Exit {
                return Outcome::Exit;
            }
            replies.push(self.perform(action, recent).await);
        }

        Outcome::Reply(replies.join(" "))
    }

    /// Launch the editor with empty content
    ///
    /// # Errors
    ///
    /// Returns error if the editor cannot be started
    pub async fn open_editor(&self) -> Result<()> {
        self.collaborators
            .automation
            .launch(&self.editor.executable)
            .await
    }

    /// Type a dictated line into the editor window
    ///
    /// # Errors
    ///
    /// Returns error if the window cannot be found or typed into
    pub async fn type_into_editor(&self, text: &str) -> Result<()> {
        self.collaborators
            .automation
            .type_text(&self.editor.window_title, text)
            .await
    }

    async fn perform(&self, action: &Action, recent: &mut RecentSearches) -> String {
        match action {
            Action::SearchWeb(query) => {
                self.search(query, "Google", scrape::google_search_url, &mut recent.web)
                    .await
            }
            Action::SearchVideo(query) => {
                self.search(query, "YouTube", scrape::youtube_search_url, &mut recent.video)
                    .await
            }
            Action::OpenFirstWebResult => self.open_first_web_result(recent.web.as_deref()).await,
            Action::OpenFirstVideo => self.open_first_video(recent.video.as_deref()).await,
            Action::OpenWebsite(name) => self.open_website(name).await,
            Action::OpenAndWriteEditor(text) => self.open_and_write(text).await,
            Action::OpenEditorDictation => match self.open_editor().await {
                Ok(()) => "Opened Notepad for dictation.".to_string(),
                Err(e) => format!("Could not open Notepad: {e}"),
            },
            Action::OpenApplication(name) => self.open_application(name).await,
            Action::CreateFolder(name) => {
                match self.collaborators.filesystem.create_directory(name).await {
                    Ok(_) => format!("Folder {name} created."),
                    Err(e) => {
                        tracing::warn!(folder = %name, error = %e, "folder creation failed");
                        "Could not create folder.".to_string()
                    }
                }
            }
            Action::SetVolume(level) => match self.collaborators.controls.set_volume(*level).await {
                Ok(()) => format!("Volume set to {level}."),
                Err(e) => format!("Volume control error: {e}"),
            },
            Action::AdjustBrightness(level) => {
                match self.collaborators.controls.set_brightness(*level).await {
                    Ok(()) => format!("Brightness set to {level}."),
                    Err(e) => format!("Brightness control error: {e}"),
                }
            }
            Action::QueryLlm(prompt) => self.query_llm(prompt).await,
            // handled by `dispatch`
            Action::Exit => String::new(),
        }
    }

    async fn search(
        &self,
        query: &str,
        engine: &str,
        build_url: fn(&str) -> String,
        last: &mut Option<String>,
    ) -> String {
        if query.trim().is_empty() {
            return "No search query provided.".to_string();
        }

        let url = build_url(query);
        *last = Some(url.clone());

        match self.collaborators.browser.open_url(&url, false).await {
            Ok(()) => format!("Searched {engine} for {query}."),
            Err(e) => format!("Could not open the browser: {e}"),
        }
    }

    async fn open_first_web_result(&self, last: Option<&str>) -> String {
        let Some(search_url) = last else {
            return "No recent Google search to open.".to_string();
        };

        match self.collaborators.results.first_web_result(search_url).await {
            Ok(Some(url)) => match self.collaborators.browser.open_url(&url, false).await {
                Ok(()) => format!("Opened first Google result: {url}"),
                Err(e) => format!("Error opening first Google result: {e}"),
            },
            Ok(None) => "Couldn't find the first Google result.".to_string(),
            Err(e) => format!("Error opening first Google result: {e}"),
        }
    }

    async fn open_first_video(&self, last: Option<&str>) -> String {
        let Some(search_url) = last else {
            return "No recent YouTube search to open.".to_string();
        };

        match self.collaborators.results.first_video(search_url).await {
            Ok(Some(url)) => match self.collaborators.browser.open_url(&url, false).await {
                Ok(()) => format!("Opened first YouTube video: {url}"),
                Err(e) => format!("Error opening first YouTube video: {e}"),
            },
            Ok(None) => "Couldn't find the first YouTube video.".to_string(),
            Err(e) => format!("Error opening first YouTube video: {e}"),
        }
    }

    async fn open_website(&self, name: &str) -> String {
        let url = website_url(name);
        let label = capitalize(name.trim());

        match self.collaborators.browser.open_url(&url, true).await {
            Ok(()) => format!("Opened {label}."),
            Err(e) => format!("Could not open {label}: {e}"),
        }
    }

    async fn open_and_write(&self, text: &str) -> String {
        if let Err(e) = self.open_editor().await {
            return format!("Could not write in Notepad: {e}");
        }

        if text.is_empty() {
            return "Opened Notepad.".to_string();
        }

        if !self.editor_settle.is_zero() {
            tokio::time::sleep(self.editor_settle).await;
        }

        match self.type_into_editor(text).await {
            Ok(()) => format!("Opened Notepad and wrote: {text}"),
            Err(e) => format!("Could not write in Notepad: {e}"),
        }
    }

    async fn open_application(&self, name: &str) -> String {
        let name = name.trim();
        if name.is_empty() {
            return "I didn't catch which application to open.".to_string();
        }

        let executable = executable_for(name, &self.editor.executable);
        match self.collaborators.automation.launch(&executable).await {
            Ok(()) => format!("Opened {executable}."),
            Err(e) => {
                tracing::warn!(executable = %executable, error = %e, "launch failed");
                format!("Could not open {name}.")
            }
        }
    }

    async fn query_llm(&self, prompt: &str) -> String {
        match self.collaborators.llm.generate(prompt).await {
            Ok(text) if text.trim().is_empty() => {
                "The language model returned no answer.".to_string()
            }
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "language model query failed");
                format!("Failed to reach the language model: {e}")
            }
        }
    }
}

/// Home page for a short site name
#[must_use]
pub fn website_url(name: &str) -> String {
    let name = name.trim().to_lowercase();
    match name.as_str() {
        "youtube" => "https://www.youtube.com".to_string(),
        "google" => "https://www.google.com".to_string(),
        _ => format!("https://www.{name}.com"),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_website_url() {
        assert_eq!(website_url("YouTube"), "https://www.youtube.com");
        assert_eq!(website_url("google"), "https://www.google.com");
        assert_eq!(website_url("github"), "https://www.github.com");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("youtube"), "Youtube");
        assert_eq!(capitalize("GOOGLE"), "Google");
        assert_eq!(capitalize(""), "");
    }
}
