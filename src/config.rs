//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `PORT`, `LAWDIO_LOG_LEVEL` and `LAWDIO_NOTES_DIR` env
//! overrides. The provider API key is sourced from `LLM_API_KEY` only —
//! never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (e.g. `"0.0.0.0"`).
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Directory of static assets served at `/` (already expanded, no `~`).
    pub public_dir: PathBuf,
}

/// Notes Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory receiving exported `.docx` files (already expanded, no `~`).
    pub notes_dir: PathBuf,
}

/// OpenAI / OpenAI-compatible chat provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (e.g. `"dummy"`, `"openai"`).
    /// Maps to `default` in `[llm]` TOML — named `default` there to signal
    /// that other provider sections can coexist without being loaded.
    pub provider: String,
    /// Config for the OpenAI / OpenAI-compatible provider (`[llm.openai]`).
    pub openai: OpenAiConfig,
}

/// Speech synthesis configuration (`[speech]`).
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Whether `/api/ask` responses carry synthesized audio.
    pub enabled: bool,
    /// Full speech endpoint URL.
    pub api_base_url: String,
    /// Text-to-speech model name.
    pub model: String,
    /// Voice selection passed in the request body.
    pub voice: String,
    /// Per-request HTTP timeout in seconds for the speech call.
    pub timeout_seconds: u64,
    /// When `true`, a synthesis failure fails the whole request instead of
    /// returning the answer text alone.
    pub require_audio: bool,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub log_level: String,
    /// API key from `LLM_API_KEY` env var — `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
}

impl Config {
    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    storage: RawStorage,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    speech: RawSpeech,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_public_dir")]
    public_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Deserialize)]
struct RawStorage {
    #[serde(default = "default_notes_dir")]
    notes_dir: String,
}

impl Default for RawStorage {
    fn default() -> Self {
        Self { notes_dir: default_notes_dir() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawSpeech {
    #[serde(default = "default_false")]
    enabled: bool,
    #[serde(default = "default_speech_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_speech_model")]
    model: String,
    #[serde(default = "default_speech_voice")]
    voice: String,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_false")]
    require_audio: bool,
}

impl Default for RawSpeech {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: default_speech_api_base_url(),
            model: default_speech_model(),
            voice: default_speech_voice(),
            timeout_seconds: default_openai_timeout_seconds(),
            require_audio: false,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_public_dir() -> String { "public".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_notes_dir() -> String { "notes".to_string() }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_openai_timeout_seconds() -> u64 { 60 }
fn default_speech_api_base_url() -> String { "https://api.openai.com/v1/audio/speech".to_string() }
fn default_speech_model() -> String { "gpt-4o-mini-tts".to_string() }
fn default_speech_voice() -> String { "alloy".to_string() }
fn default_false() -> bool { false }

/// Load config from `path` (or `config/default.toml`), then apply env-var
/// overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let port_override = env::var("PORT").ok();
    let log_level_override = env::var("LAWDIO_LOG_LEVEL").ok();
    let notes_dir_override = env::var("LAWDIO_NOTES_DIR").ok();
    load_from(
        Path::new(path.unwrap_or("config/default.toml")),
        port_override.as_deref(),
        log_level_override.as_deref(),
        notes_dir_override.as_deref(),
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    port_override: Option<&str>,
    log_level_override: Option<&str>,
    notes_dir_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let port = match port_override {
        Some(p) => p
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("invalid PORT '{p}': {e}")))?,
        None => parsed.server.port,
    };
    let log_level = log_level_override
        .unwrap_or(&parsed.server.log_level)
        .to_string();
    let notes_dir = expand_home(notes_dir_override.unwrap_or(&parsed.storage.notes_dir));

    Ok(Config {
        server: ServerConfig {
            host: parsed.server.host,
            port,
            public_dir: expand_home(&parsed.server.public_dir),
        },
        storage: StorageConfig { notes_dir },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        speech: SpeechConfig {
            enabled: parsed.speech.enabled,
            api_base_url: parsed.speech.api_base_url,
            model: parsed.speech.model,
            voice: parsed.speech.voice,
            timeout_seconds: parsed.speech.timeout_seconds,
            require_audio: parsed.speech.require_audio,
        },
        log_level,
        llm_api_key: env::var("LLM_API_KEY").ok(),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
