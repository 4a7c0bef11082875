//! Upstream provider abstraction — question answering and speech synthesis.
//!
//! `TutorProvider` is an enum over concrete provider implementations.
//! Enum dispatch avoids `dyn` trait objects and the `async-trait`
//! dependency. Adding a backend = new module + new variant + new match arms.
//!
//! Provider instances are shared immutable capabilities — clone them freely.

pub mod dummy;
pub mod openai;

use thiserror::Error;

use crate::config::{LlmConfig, SpeechConfig};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Fixed prompt material ─────────────────────────────────────────────────────

/// System instruction sent with every question. The question itself is the
/// sole user turn — no history.
pub const TUTOR_INSTRUCTION: &str =
    "You are a helpful tutor for law students. Explain concepts clearly and concisely.";

/// Returned when the upstream call succeeds but carries no usable text.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate an answer.";

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum TutorProvider {
    Dummy(dummy::DummyProvider),
    OpenAi(openai::OpenAiProvider),
}

impl TutorProvider {
    /// One round-trip question → answer text. Never returns an empty string:
    /// an answerless success yields [`FALLBACK_ANSWER`].
    pub async fn answer(&self, question: &str) -> Result<String, ProviderError> {
        match self {
            TutorProvider::Dummy(p) => p.answer(question).await,
            TutorProvider::OpenAi(p) => p.answer(question).await,
        }
    }

    /// One round-trip text → encoded audio bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        match self {
            TutorProvider::Dummy(p) => p.synthesize(text).await,
            TutorProvider::OpenAi(p) => p.synthesize(text).await,
        }
    }
}

/// Construct a [`TutorProvider`] from config and an optional API key.
///
/// `api_key` is sourced from `LLM_API_KEY` env (never TOML) and is `None`
/// for keyless local models.
pub fn build(
    llm: &LlmConfig,
    speech: &SpeechConfig,
    api_key: Option<String>,
) -> Result<TutorProvider, ProviderError> {
    match llm.provider.as_str() {
        "dummy" => Ok(TutorProvider::Dummy(dummy::DummyProvider::default())),
        "openai" | "openai-compatible" => {
            let p = openai::OpenAiProvider::new(&llm.openai, speech, api_key)?;
            Ok(TutorProvider::OpenAi(p))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OpenAiConfig, SpeechConfig};

    fn llm_config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            openai: OpenAiConfig {
                api_base_url: "http://localhost:0/v1/chat/completions".into(),
                model: "test-model".into(),
                temperature: 0.0,
                timeout_seconds: 1,
            },
        }
    }

    fn speech_config() -> SpeechConfig {
        SpeechConfig {
            enabled: false,
            api_base_url: "http://localhost:0/v1/audio/speech".into(),
            model: "test-tts".into(),
            voice: "alloy".into(),
            timeout_seconds: 1,
            require_audio: false,
        }
    }

    #[test]
    fn build_dummy() {
        let p = build(&llm_config("dummy"), &speech_config(), None).unwrap();
        assert!(matches!(p, TutorProvider::Dummy(_)));
    }

    #[test]
    fn build_openai() {
        let p = build(&llm_config("openai"), &speech_config(), Some("k".into())).unwrap();
        assert!(matches!(p, TutorProvider::OpenAi(_)));
    }

    #[test]
    fn build_unknown_errors() {
        let err = build(&llm_config("mystery"), &speech_config(), None).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(_)));
    }
}
