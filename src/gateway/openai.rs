//! OpenAI-compatible provider (`/v1/chat/completions` + `/v1/audio/speech`).
//!
//! All wire types are private to this module — callers never see them.
//! Each method is one round-trip with a bounded per-request timeout and no
//! retry; the handler layer decides what a failure means for the response.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use super::{ProviderError, FALLBACK_ANSWER, TUTOR_INSTRUCTION};
use crate::config::{OpenAiConfig, SpeechConfig};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing the OpenAI chat completions
/// and audio speech APIs.
///
/// Covers OpenAI, OpenAI-compatible local servers (Ollama, LM Studio…),
/// and hosted alternatives. Constructed once at startup, then cheaply cloned
/// because `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    chat_url: String,
    model: String,
    temperature: f32,
    speech_url: String,
    speech_model: String,
    voice: String,
    speech_timeout: Duration,
    api_key: Option<String>,
}

impl OpenAiProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(
        llm: &OpenAiConfig,
        speech: &SpeechConfig,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            chat_url: llm.api_base_url.clone(),
            model: llm.model.clone(),
            temperature: llm.temperature,
            speech_url: speech.api_base_url.clone(),
            speech_model: speech.model.clone(),
            voice: speech.voice.clone(),
            speech_timeout: Duration::from_secs(speech.timeout_seconds),
            api_key,
        })
    }

    /// Send `question` as the sole user turn with the fixed tutor instruction.
    ///
    /// An HTTP-level failure is an error; a successful response with empty or
    /// missing content yields [`FALLBACK_ANSWER`] instead.
    pub async fn answer(&self, question: &str) -> Result<String, ProviderError> {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if self.model.starts_with("gpt-5") {
            None
        } else {
            Some(self.temperature)
        };

        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message { role: "system".to_string(), content: TUTOR_INSTRUCTION.to_string() },
                Message { role: "user".to_string(), content: question.to_string() },
            ],
            temperature,
        };

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            question_len = question.len(),
            "sending chat completion request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full chat request payload");
        }

        let mut req = self.client.post(&self.chat_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.chat_url, error = %e, "chat HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize chat response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received chat response");

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_ANSWER.to_string());

        Ok(text)
    }

    /// Send `text` to the speech endpoint with the fixed voice; returns the
    /// raw encoded audio bytes of the response body.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let payload = SpeechRequest {
            model: self.speech_model.clone(),
            voice: self.voice.clone(),
            input: text.to_string(),
        };

        debug!(model = %payload.model, voice = %payload.voice, input_len = text.len(),
            "sending speech request");

        let mut req = self
            .client
            .post(&self.speech_url)
            .timeout(self.speech_timeout)
            .json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.speech_url, error = %e, "speech HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let bytes = response.bytes().await.map_err(|e| {
            error!(error = %e, "failed to read speech response body");
            ProviderError::Request(format!("failed to read audio body: {e}"))
        })?;

        debug!(audio_bytes = bytes.len(), "received speech response");
        Ok(bytes.to_vec())
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest {
    model: String,
    voice: String,
    input: String,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env
            .error
            .code
            .map(|v| match v {
                serde_json::Value::String(s) => format!(" [code={s}]"),
                other => format!(" [code={other}]"),
            })
            .unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "upstream request returned HTTP error");
    Err(ProviderError::Request(message))
}
