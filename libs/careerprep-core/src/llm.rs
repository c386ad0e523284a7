//! Optional language-model capability.
//!
//! Every feature treats the model as best-effort enrichment: an unavailable
//! model, a transport error or an empty reply all collapse to `None` through
//! [`complete_optional`]. Nothing here retries.

use anyhow::{anyhow, bail, Context, Result};
use careerprep_common::config::ModelConfig;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const CODING_TUTOR_SYSTEM_PROMPT: &str = "You are a helpful coding interview tutor. \
Respond with hints first, then a reference answer only if asked.";

pub const CAREER_COACH_SYSTEM_PROMPT: &str =
    "You are an expert career coach. Provide concise, actionable feedback.";

pub const INTERVIEWER_SYSTEM_PROMPT: &str = "You are a tough but fair interviewer. \
Respond with realistic follow-up questions and targeted feedback.";

/// System prompt and sampling temperature for one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Persona {
    pub system_prompt: &'static str,
    pub temperature: f32,
}

pub const CODING_TUTOR: Persona = Persona {
    system_prompt: CODING_TUTOR_SYSTEM_PROMPT,
    temperature: 0.3,
};

pub const CAREER_COACH: Persona = Persona {
    system_prompt: CAREER_COACH_SYSTEM_PROMPT,
    temperature: 0.4,
};

pub const INTERVIEWER: Persona = Persona {
    system_prompt: INTERVIEWER_SYSTEM_PROMPT,
    temperature: 0.5,
};

/// Transcription models tried in order
pub const TRANSCRIPTION_MODELS: &[&str] = &["gpt-4o-mini-transcribe", "whisper-1"];

#[allow(async_fn_in_trait)]
pub trait LanguageModel {
    fn is_available(&self) -> bool;

    async fn complete(&self, persona: &Persona, user_prompt: &str) -> Result<String>;
}

/// Speech-to-text for recorded interview answers
#[allow(async_fn_in_trait)]
pub trait Transcriber {
    fn can_transcribe(&self) -> bool;

    async fn transcribe(&self, audio: &Path) -> Result<String>;
}

/// Ask the model if it is available; any failure is logged and becomes `None`
pub async fn complete_optional<M: LanguageModel>(
    model: &M,
    persona: &Persona,
    user_prompt: &str,
) -> Option<String> {
    if !model.is_available() {
        debug!("Language model unavailable, skipping");
        return None;
    }

    match model.complete(persona, user_prompt).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            warn!("Language model returned an empty completion");
            None
        }
        Err(e) => {
            warn!(error = %e, "Language model call failed");
            None
        }
    }
}

/// Transcribe if possible; failures are logged and become `None`
pub async fn transcribe_optional<T: Transcriber>(transcriber: &T, audio: &Path) -> Option<String> {
    if !transcriber.can_transcribe() {
        debug!("Transcription unavailable, skipping");
        return None;
    }

    match transcriber.transcribe(audio).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            warn!(path = %audio.display(), "Transcription was empty");
            None
        }
        Err(e) => {
            warn!(path = %audio.display(), error = %e, "Transcription failed");
            None
        }
    }
}

/// Model that is never available
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledModel;

impl LanguageModel for DisabledModel {
    fn is_available(&self) -> bool {
        false
    }

    async fn complete(&self, _persona: &Persona, _user_prompt: &str) -> Result<String> {
        bail!("language model is disabled")
    }
}

impl Transcriber for DisabledModel {
    fn can_transcribe(&self) -> bool {
        false
    }

    async fn transcribe(&self, _audio: &Path) -> Result<String> {
        bail!("transcription is disabled")
    }
}

/// OpenAI-compatible `/chat/completions` and `/audio/transcriptions` client
pub struct OpenAiChatModel {
    client: Client,
    endpoint: String,
    transcription_endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiChatModel {
    /// Build a client; available only when the configured key variable is set
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = config.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url),
            transcription_endpoint: format!("{}/audio/transcriptions", base_url),
            model: config.model.clone(),
            api_key: config.api_key(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transcription_endpoint(&self) -> &str {
        &self.transcription_endpoint
    }

    async fn transcribe_with(&self, api_key: &str, model: &str, audio: &Path) -> Result<String> {
        let bytes = tokio::fs::read(audio)
            .await
            .with_context(|| format!("Failed to read audio {}", audio.display()))?;
        let file_name = audio
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "answer.wav".to_string());

        let form = Form::new()
            .text("model", model.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(&self.transcription_endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to send transcription request")?
            .error_for_status()
            .context("Transcription request rejected")?
            .json::<TranscriptionResponse>()
            .await
            .context("Failed to parse transcription response")?;

        Ok(response.text)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl LanguageModel for OpenAiChatModel {
    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, persona: &Persona, user_prompt: &str) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            bail!("no API key configured");
        };

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: persona.system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            temperature: persona.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send chat completion request")?
            .error_for_status()
            .context("Chat completion request rejected")?
            .json::<ChatResponse>()
            .await
            .context("Failed to parse chat completion response")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .context("Chat completion contained no content")
    }
}

impl Transcriber for OpenAiChatModel {
    fn can_transcribe(&self) -> bool {
        self.api_key.is_some()
    }

    /// First model that answers wins
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            bail!("no API key configured");
        };

        let mut last_error = None;
        for model in TRANSCRIPTION_MODELS {
            match self.transcribe_with(api_key, model, audio).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    debug!(model, error = %e, "Transcription model failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("no transcription models configured")))
    }
}
