/// TTS provider trait and the OpenAI speech endpoint.
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Audio format for TTS output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    Pcm,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Opus => "audio/opus",
            Self::Aac => "audio/aac",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Pcm => "audio/pcm",
        }
    }

    pub fn openai_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    /// Formats whose byte streams stay playable when concatenated.
    pub fn concatenates(&self) -> bool {
        matches!(self, Self::Mp3 | Self::Aac | Self::Pcm)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.openai_str())
    }
}

impl FromStr for AudioFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "opus" => Ok(Self::Opus),
            "aac" => Ok(Self::Aac),
            "flac" => Ok(Self::Flac),
            "wav" => Ok(Self::Wav),
            "pcm" => Ok(Self::Pcm),
            other => anyhow::bail!("unsupported audio format '{other}'"),
        }
    }
}

/// A TTS request.
#[derive(Debug, Clone, Default)]
pub struct TtsRequest {
    pub text: String,
    /// Overrides the provider's default voice.
    pub voice: Option<String>,
    pub format: AudioFormat,
}

/// Returns raw audio bytes.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes>;
}

// ---------------------------------------------------------------------------
// OpenAI TTS
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "tts-1";
pub const DEFAULT_VOICE: &str = "echo";

pub struct OpenAiTts {
    api_key: String,
    base_url: String,
    model: String,
    default_voice: String,
    client: Client,
}

impl OpenAiTts {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            default_voice: DEFAULT_VOICE.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn voice(&self) -> &str {
        &self.default_voice
    }

    fn body(&self, req: TtsRequest) -> OpenAiTtsBody {
        OpenAiTtsBody {
            model: self.model.clone(),
            input: req.text,
            voice: req.voice.unwrap_or_else(|| self.default_voice.clone()),
            response_format: (req.format != AudioFormat::Mp3).then(|| req.format.openai_str()),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiTtsBody {
    model: String,
    input: String,
    voice: String,
    /// Omitted for mp3, the endpoint's default.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'static str>,
}

#[async_trait]
impl TtsProvider for OpenAiTts {
    fn name(&self) -> &str {
        "openai"
    }

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes> {
        let body = self.body(req);
        info!(model = %body.model, voice = %body.voice, chars = body.input.chars().count(), "Synthesizing speech");
        let bytes = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI speech HTTP request failed")?
            .error_for_status()
            .context("OpenAI speech request rejected")?
            .bytes()
            .await
            .context("Failed to read OpenAI speech audio")?;
        debug!(bytes = bytes.len(), "Speech audio received");
        Ok(bytes)
    }
}
