//! TOML configuration file loading
//!
//! Supports `~/.config/cs2p/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AssistantConfigFile {
    /// Assistant identity and wake settings
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Session history settings
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Local language model settings
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Text editor used for dictation
    #[serde(default)]
    pub editor: EditorFileConfig,

    /// Command interpretation settings
    #[serde(default)]
    pub commands: CommandsFileConfig,
}

/// Assistant identity
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Display name used in transcripts (e.g. "CS2P")
    pub name: Option<String>,

    /// Wake word (e.g. "c2")
    pub wake_word: Option<String>,

    /// Phrases that terminate the assistant while waiting for the wake word
    pub kill_phrases: Option<Vec<String>>,

    /// Input mode: "text" or "voice"
    pub input: Option<String>,
}

/// Session history settings
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub max_history: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub check_interval_secs: Option<u64>,
}

/// Language model settings
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Base URL of the generation server
    pub url: Option<String>,

    /// Model identifier (e.g. "tinyllama")
    pub model: Option<String>,

    pub max_tokens: Option<u32>,
    pub stream_timeout_secs: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// API key for the Whisper transcription endpoint
    pub stt_api_key: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Program used to speak text (receives the text as its last argument)
    pub tts_command: Option<String>,

    pub listen_timeout_secs: Option<u64>,
    pub phrase_time_limit_secs: Option<u64>,
}

/// Dictation editor
#[derive(Debug, Default, Deserialize)]
pub struct EditorFileConfig {
    pub executable: Option<String>,
    pub window_title: Option<String>,
}

/// Command interpretation
#[derive(Debug, Default, Deserialize)]
pub struct CommandsFileConfig {
    /// Application names the fuzzy matcher may correct towards
    pub known_apps: Option<Vec<String>>,

    /// Snap noisy utterances onto canonical command phrases
    pub normalize: Option<bool>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AssistantConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> AssistantConfigFile {
    let Some(path) = config_file_path() else {
        return AssistantConfigFile::default();
    };

    if !path.exists() {
        return AssistantConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config file, using defaults"
            );
            AssistantConfigFile::default()
        }),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AssistantConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config(content: &str) -> crate::Result<AssistantConfigFile> {
    let config = toml::from_str(content)?;
    tracing::info!("loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/cs2p/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("cs2p").join("config.toml"))
}
