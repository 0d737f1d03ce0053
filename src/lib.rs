//! CS2P - desktop voice assistant
//!
//! This library provides the core functionality for the assistant:
//! - Intent classification of noisy transcribed utterances
//! - Safe arithmetic evaluation with follow-up answers
//! - Action dispatch to browser, desktop, volume/brightness and a local LLM
//! - Dialogue and dictation state with a bounded, expiring session
//! - Voice capture (energy segmentation + Whisper) and spoken replies
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │        Console  │  Microphone  │  Speech            │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                     Daemon                           │
//! │   Conversation  │  Session  │  Capture  │  Speaker  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │           Classifier  →  Dispatcher                  │
//! │   Browser  │  Desktop  │  Controls  │  LLM  │  Web  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod arithmetic;
pub mod config;
pub mod daemon;
pub mod dialogue;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod llm;
pub mod platform;
pub mod scrape;
pub mod session;
pub mod voice;

pub use config::Config;
pub use daemon::Daemon;
pub use dialogue::{Conversation, DialogueState, Response};
pub use dispatch::{Collaborators, Dispatcher, Outcome, RecentSearches};
pub use error::{Error, Result};
pub use intent::{Action, ActionSequence, Classifier};
pub use session::{SessionStore, SharedSession};
