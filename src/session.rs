//! Conversation session store
//!
//! Keeps a bounded transcript of recent turns and tracks idle expiry.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::config::SessionConfig;

/// Who produced a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The person talking to the assistant
    User,
    /// The assistant's reply
    Assistant,
    /// Status notices ("Session cleared.")
    System,
}

/// One transcript line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Speaker of the line
    pub role: Role,
    /// Line text without the speaker prefix
    pub text: String,
    /// When the line was recorded
    pub timestamp: DateTime<Utc>,
}

impl SessionEntry {
    /// Render with the speaker prefix used in transcripts
    #[must_use]
    pub fn render(&self, assistant_name: &str) -> String {
        match self.role {
            Role::User => format!("You: {}", self.text),
            Role::Assistant => format!("{assistant_name}: {}", self.text),
            Role::System => self.text.clone(),
        }
    }
}

impl fmt::Display for SessionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("Assistant"))
    }
}

/// Bounded, time-limited conversation history
#[derive(Debug)]
pub struct SessionStore {
    max_history: usize,
    timeout: Duration,
    history: VecDeque<SessionEntry>,
    last_active: Instant,
}

/// Session store shared between the conversation and the expiry timer
pub type SharedSession = Arc<Mutex<SessionStore>>;

impl SessionStore {
    /// Create an empty session
    #[must_use]
    pub fn new(max_history: usize, timeout: Duration) -> Self {
        Self {
            max_history,
            timeout,
            history: VecDeque::with_capacity(max_history),
            last_active: Instant::now(),
        }
    }

    /// Create a session from configuration
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_history, config.timeout)
    }

    /// Wrap in a mutex for sharing with the expiry timer
    #[must_use]
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Append a line, evicting the oldest beyond `max_history`, and mark activity
    pub fn add(&mut self, role: Role, text: impl Into<String>) {
        self.history.push_back(SessionEntry {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        });
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
        self.last_active = Instant::now();
    }

    /// Transcript lines, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &SessionEntry> {
        self.history.iter()
    }

    /// Number of stored lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether no lines are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Empty the history and reset the activity clock
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_active = Instant::now();
    }

    /// Whether the idle time strictly exceeds the timeout
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiry check against an explicit instant
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_active) > self.timeout
    }

    /// Time of the last `add` or `clear`
    #[must_use]
    pub const fn last_active(&self) -> Instant {
        self.last_active
    }

    /// Configured idle timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_eviction() {
        let mut session = SessionStore::new(3, Duration::from_secs(300));
        for i in 0..5 {
            session.add(Role::User, format!("line {i}"));
        }

        let texts: Vec<_> = session.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_default_keeps_last_ten() {
        let mut session = SessionStore::default();
        for i in 0..15 {
            session.add(Role::User, format!("line {i}"));
        }

        assert_eq!(session.len(), 10);
        let texts: Vec<_> = session.entries().map(|e| e.text.clone()).collect();
        let expected: Vec<_> = (5..15).map(|i| format!("line {i}")).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn test_expiry_is_strict() {
        let session = SessionStore::new(10, Duration::from_secs(300));
        let start = session.last_active();

        assert!(!session.is_expired_at(start + Duration::from_secs(300)));
        assert!(session.is_expired_at(start + Duration::from_secs(300) + Duration::from_millis(1)));
    }

    #[test]
    fn test_clear_resets_activity() {
        let mut session = SessionStore::new(10, Duration::from_secs(300));
        session.add(Role::User, "hello");
        let before = session.last_active();

        session.clear();
        assert!(session.is_empty());
        assert!(session.last_active() >= before);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_render_prefixes() {
        let mut session = SessionStore::default();
        session.add(Role::User, "open chrome");
        session.add(Role::Assistant, "Opened chrome.exe.");
        session.add(Role::System, "Session cleared.");

        let lines: Vec<_> = session.entries().map(|e| e.render("CS2P")).collect();
        assert_eq!(lines, ["You: open chrome", "CS2P: Opened chrome.exe.", "Session cleared."]);
    }
}
