//! Configuration management for the CS2P assistant

pub mod file;

use std::time::Duration;

use file::AssistantConfigFile;

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Name shown in transcripts ("CS2P: ...")
    pub name: String,

    /// Wake word that activates listening in voice mode
    pub wake_word: String,

    /// Phrases that terminate the assistant while it waits for the wake word
    pub kill_phrases: Vec<String>,

    /// Where utterances come from
    pub input: InputMode,

    /// Session history configuration
    pub session: SessionConfig,

    /// Local language model configuration
    pub llm: LlmConfig,

    /// Voice capture/synthesis configuration
    pub voice: VoiceConfig,

    /// Text editor used for dictation and "open notepad and type ..."
    pub editor: EditorConfig,

    /// Application names the fuzzy matcher may correct towards
    pub known_apps: Vec<String>,

    /// Snap noisy utterances onto canonical command phrases before classification
    pub normalize_commands: bool,
}

/// Source of utterances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Typed commands on stdin
    #[default]
    Text,
    /// Microphone capture gated by the wake word
    Voice,
}

impl InputMode {
    /// Parse an input mode, returning `None` for unknown values
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "console" => Some(Self::Text),
            "voice" | "mic" => Some(Self::Voice),
            _ => None,
        }
    }
}

/// Session history configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of transcript lines kept
    pub max_history: usize,

    /// Idle time after which the session expires
    pub timeout: Duration,

    /// How often expiry is checked
    pub check_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: 10,
            timeout: Duration::from_secs(300),
            check_interval: Duration::from_secs(10),
        }
    }
}

/// Local language model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Generation server base URL
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Token budget passed in `options.max_tokens`
    pub max_tokens: u32,

    /// Abandon the request if no stream data arrives for this long
    pub stream_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "tinyllama".to_string(),
            max_tokens: 100,
            stream_timeout: Duration::from_secs(20),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// API key for Whisper transcription
    pub stt_api_key: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// Override for the speech synthesis program
    pub tts_command: Option<String>,

    /// Give up if no speech starts within this time
    pub listen_timeout: Duration,

    /// Maximum length of a single utterance
    pub phrase_time_limit: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_api_key: None,
            stt_model: "whisper-1".to_string(),
            tts_command: None,
            listen_timeout: Duration::from_secs(5),
            phrase_time_limit: Duration::from_secs(7),
        }
    }
}

/// Dictation editor configuration
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Program launched for dictation
    pub executable: String,

    /// Title of the window keystrokes are sent to
    pub window_title: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        if cfg!(target_os = "windows") {
            Self {
                executable: "notepad.exe".to_string(),
                window_title: "Notepad".to_string(),
            }
        } else if cfg!(target_os = "macos") {
            Self {
                executable: "TextEdit".to_string(),
                window_title: "TextEdit".to_string(),
            }
        } else {
            Self {
                executable: "gedit".to_string(),
                window_title: "gedit".to_string(),
            }
        }
    }
}

/// Default applications known to the fuzzy matcher
pub const DEFAULT_KNOWN_APPS: &[&str] = &["notepad", "calculator", "chrome", "spotify"];

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "CS2P".to_string(),
            wake_word: "c2".to_string(),
            kill_phrases: vec!["kill".to_string(), "die".to_string()],
            input: InputMode::default(),
            session: SessionConfig::default(),
            llm: LlmConfig::default(),
            voice: VoiceConfig::default(),
            editor: EditorConfig::default(),
            known_apps: DEFAULT_KNOWN_APPS.iter().map(ToString::to_string).collect(),
            normalize_commands: true,
        }
    }
}

impl Config {
    /// Load configuration from the environment and config file
    #[must_use]
    pub fn load() -> Self {
        Self::load_with_options(None)
    }

    /// Load configuration, optionally forcing the input mode
    #[must_use]
    pub fn load_with_options(input: Option<InputMode>) -> Self {
        let fc = file::load_config_file();
        let mut config = Self::from_sources(fc, |key| std::env::var(key).ok());

        if let Some(input) = input {
            config.input = input;
        }

        config
    }

    /// Merge a parsed config file with environment lookups (env > toml > default)
    #[must_use]
    pub fn from_sources(fc: AssistantConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let input = env("CS2P_INPUT")
            .or(fc.assistant.input)
            .map_or(defaults.input, |s| {
                InputMode::parse(&s).unwrap_or_else(|| {
                    tracing::warn!(input = %s, "unknown input mode, using text");
                    InputMode::Text
                })
            });

        let session = SessionConfig {
            max_history: env("CS2P_MAX_HISTORY")
                .and_then(|s| s.parse().ok())
                .or(fc.session.max_history)
                .unwrap_or(defaults.session.max_history),
            timeout: env("CS2P_SESSION_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .or(fc.session.timeout_secs)
                .map_or(defaults.session.timeout, Duration::from_secs),
            check_interval: fc
                .session
                .check_interval_secs
                .filter(|secs| *secs > 0)
                .map_or(defaults.session.check_interval, Duration::from_secs),
        };

        let llm = LlmConfig {
            base_url: env("CS2P_LLM_URL")
                .or(fc.llm.url)
                .unwrap_or(defaults.llm.base_url),
            model: env("CS2P_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or(defaults.llm.model),
            max_tokens: fc.llm.max_tokens.unwrap_or(defaults.llm.max_tokens),
            stream_timeout: fc
                .llm
                .stream_timeout_secs
                .map_or(defaults.llm.stream_timeout, Duration::from_secs),
        };

        let voice = VoiceConfig {
            stt_api_key: env("OPENAI_API_KEY").or(fc.voice.stt_api_key),
            stt_model: env("CS2P_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.voice.stt_model),
            tts_command: env("CS2P_TTS_COMMAND").or(fc.voice.tts_command),
            listen_timeout: fc
                .voice
                .listen_timeout_secs
                .map_or(defaults.voice.listen_timeout, Duration::from_secs),
            phrase_time_limit: fc
                .voice
                .phrase_time_limit_secs
                .map_or(defaults.voice.phrase_time_limit, Duration::from_secs),
        };

        let editor = EditorConfig {
            executable: env("CS2P_EDITOR")
                .or(fc.editor.executable)
                .unwrap_or(defaults.editor.executable),
            window_title: fc
                .editor
                .window_title
                .unwrap_or(defaults.editor.window_title),
        };

        Self {
            name: env("CS2P_NAME")
                .or(fc.assistant.name)
                .unwrap_or(defaults.name),
            wake_word: env("CS2P_WAKE_WORD")
                .and_then(|w| non_blank_lowercase(&w))
                .or_else(|| fc.assistant.wake_word.and_then(|w| non_blank_lowercase(&w)))
                .unwrap_or(defaults.wake_word),
            kill_phrases: fc.assistant.kill_phrases.unwrap_or(defaults.kill_phrases),
            input,
            session,
            llm,
            voice,
            editor,
            known_apps: fc
                .commands
                .known_apps
                .filter(|apps| !apps.is_empty())
                .unwrap_or(defaults.known_apps),
            normalize_commands: fc
                .commands
                .normalize
                .unwrap_or(defaults.normalize_commands),
        }
    }
}

/// Trimmed, lower-cased `value`, or `None` when nothing is left
fn non_blank_lowercase(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(AssistantConfigFile::default(), no_env);
        assert_eq!(config.wake_word, "c2");
        assert_eq!(config.session.max_history, 10);
        assert_eq!(config.session.timeout, Duration::from_secs(300));
        assert_eq!(config.llm.model, "tinyllama");
        assert_eq!(config.llm.stream_timeout, Duration::from_secs(20));
        assert_eq!(config.input, InputMode::Text);
        assert!(config.normalize_commands);
    }

    #[test]
    fn test_env_overrides_file() {
        let fc = file::parse_config("[llm]\nmodel = \"llama2\"\n[session]\ntimeout_secs = 60").unwrap();
        let config = Config::from_sources(fc, |key| match key {
            "CS2P_LLM_MODEL" => Some("mistral".to_string()),
            _ => None,
        });

        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.session.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_wake_word_normalized() {
        let config = Config::from_sources(AssistantConfigFile::default(), |key| {
            (key == "CS2P_WAKE_WORD").then(|| "  Jarvis ".to_string())
        });
        assert_eq!(config.wake_word, "jarvis");
    }

    #[test]
    fn test_blank_wake_word_falls_back() {
        let fc = file::parse_config("[assistant]\nwake_word = \"  \"").unwrap();
        let config = Config::from_sources(fc, |key| {
            (key == "CS2P_WAKE_WORD").then(String::new)
        });
        assert_eq!(config.wake_word, "c2");

        let fc = file::parse_config("[assistant]\nwake_word = \"Friday\"").unwrap();
        let config = Config::from_sources(fc, |key| {
            (key == "CS2P_WAKE_WORD").then(|| " ".to_string())
        });
        assert_eq!(config.wake_word, "friday");
    }

    #[test]
    fn test_input_mode_parse() {
        assert_eq!(InputMode::parse("Voice"), Some(InputMode::Voice));
        assert_eq!(InputMode::parse("text"), Some(InputMode::Text));
        assert_eq!(InputMode::parse("carrier pigeon"), None);
    }
}
