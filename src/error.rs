//! Error types for the CS2P assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Application could not be launched
    #[error("launch error: {0}")]
    Launch(String),

    /// Window automation (typing, volume, brightness) failed
    #[error("automation error: {0}")]
    Automation(String),

    /// Browser could not be opened
    #[error("browser error: {0}")]
    Browser(String),

    /// Search results page could not be fetched or parsed
    #[error("scrape error: {0}")]
    Scrape(String),

    /// Local language model error
    #[error("language model error: {0}")]
    Llm(String),

    /// Filesystem operation failed
    #[error("filesystem error: {0}")]
    Filesystem(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
