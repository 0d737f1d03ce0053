//! Shared test utilities
//!
//! Recording doubles for every collaborator the assistant drives.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use cs2p::config::{EditorConfig, InputMode};
use cs2p::llm::LanguageModel;
use cs2p::platform::{Automation, Browser, Controls, Filesystem};
use cs2p::scrape::ResultFinder;
use cs2p::voice::{Listener, Synthesizer};
use cs2p::{Collaborators, Config, Conversation, Dispatcher, Error, Result, SessionStore};

/// Records every desktop call as a short line
#[derive(Default)]
pub struct FakeDesktop {
    calls: Mutex<Vec<String>>,
    pub fail_launch: AtomicBool,
    pub fail_typing: AtomicBool,
    pub fail_browser: AtomicBool,
}

impl FakeDesktop {
    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Browser for FakeDesktop {
    async fn open_url(&self, url: &str, reuse_tab: bool) -> Result<()> {
        if self.fail_browser.load(Ordering::SeqCst) {
            return Err(Error::Browser("no browser".to_string()));
        }
        self.record(format!("open_url {url} reuse={reuse_tab}"));
        Ok(())
    }
}

#[async_trait]
impl Automation for FakeDesktop {
    async fn launch(&self, executable: &str) -> Result<()> {
        if self.fail_launch.load(Ordering::SeqCst) {
            return Err(Error::Launch(format!("{executable}: not found")));
        }
        self.record(format!("launch {executable}"));
        Ok(())
    }

    async fn type_text(&self, window: &str, text: &str) -> Result<()> {
        if self.fail_typing.load(Ordering::SeqCst) {
            return Err(Error::Automation(format!("window {window} not found")));
        }
        self.record(format!("type {window}: {text}"));
        Ok(())
    }
}

#[async_trait]
impl Controls for FakeDesktop {
    async fn set_volume(&self, level: u8) -> Result<()> {
        self.record(format!("volume {level}"));
        Ok(())
    }

    async fn set_brightness(&self, level: u8) -> Result<()> {
        self.record(format!("brightness {level}"));
        Ok(())
    }
}

#[async_trait]
impl Filesystem for FakeDesktop {
    async fn create_directory(&self, name: &str) -> Result<PathBuf> {
        if name == "exists" {
            return Err(Error::Filesystem("already exists".to_string()));
        }
        self.record(format!("mkdir {name}"));
        Ok(PathBuf::from(name))
    }
}

/// Language model answering with a fixed reply, or failing
pub struct FakeLlm {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| Error::Llm("connection refused".to_string()))
    }
}

/// Result finder with canned first results
#[derive(Default)]
pub struct FakeResults {
    pub web: Option<String>,
    pub video: Option<String>,
    lookups: Mutex<Vec<String>>,
}

impl FakeResults {
    pub fn with(web: Option<&str>, video: Option<&str>) -> Self {
        Self {
            web: web.map(ToString::to_string),
            video: video.map(ToString::to_string),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultFinder for FakeResults {
    async fn first_web_result(&self, search_url: &str) -> Result<Option<String>> {
        self.lookups.lock().unwrap().push(search_url.to_string());
        Ok(self.web.clone())
    }

    async fn first_video(&self, search_url: &str) -> Result<Option<String>> {
        self.lookups.lock().unwrap().push(search_url.to_string());
        Ok(self.video.clone())
    }
}

/// Listener replaying a fixed list of captures, then empty strings
#[derive(Default)]
pub struct ScriptedListener {
    captures: Mutex<VecDeque<String>>,
}

impl ScriptedListener {
    pub fn new(captures: &[&str]) -> Self {
        Self {
            captures: Mutex::new(captures.iter().map(ToString::to_string).collect()),
        }
    }
}

#[async_trait]
impl Listener for ScriptedListener {
    async fn listen(&self, _timeout: Duration, _phrase_limit: Duration) -> String {
        let next = self.captures.lock().unwrap().pop_front();
        match next {
            Some(text) => text,
            None => {
                // nothing left to say; behave like a quiet room
                tokio::time::sleep(Duration::from_millis(10)).await;
                String::new()
            }
        }
    }
}

/// Synthesizer recording what was spoken
#[derive(Default)]
pub struct RecordingSynthesizer {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSynthesizer {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// All doubles wired together
pub struct Harness {
    pub desktop: Arc<FakeDesktop>,
    pub llm: Arc<FakeLlm>,
    pub results: Arc<FakeResults>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(FakeLlm::answering("I am a language model."), FakeResults::default())
    }

    pub fn with(llm: FakeLlm, results: FakeResults) -> Self {
        Self {
            desktop: Arc::new(FakeDesktop::default()),
            llm: Arc::new(llm),
            results: Arc::new(results),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            browser: self.desktop.clone(),
            automation: self.desktop.clone(),
            controls: self.desktop.clone(),
            filesystem: self.desktop.clone(),
            llm: self.llm.clone(),
            results: self.results.clone(),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.collaborators(), test_editor()).with_editor_settle(Duration::ZERO)
    }

    pub fn conversation(&self, config: &Config) -> Conversation {
        let session = SessionStore::from_config(&config.session).shared();
        Conversation::new(config, self.dispatcher(), session)
    }

    pub fn calls(&self) -> Vec<String> {
        self.desktop.calls()
    }
}

/// Editor that behaves the same on every platform
pub fn test_editor() -> EditorConfig {
    EditorConfig {
        executable: "notepad.exe".to_string(),
        window_title: "Notepad".to_string(),
    }
}

/// Default configuration with a predictable editor
pub fn test_config(input: InputMode) -> Config {
    Config {
        input,
        editor: test_editor(),
        ..Config::default()
    }
}
