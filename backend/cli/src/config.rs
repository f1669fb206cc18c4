use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use papervoice_config::schema::{LoggingConfig, NormalizeConfig, ServerConfig, SpeechConfig};
use papervoice_config::{config_dir, config_file_path, PaperVoiceConfig};
use papervoice_core::VoiceError;
use papervoice_explain::{ExplainPipeline, ExplainSettings, Explainer, OpenAiProvider};
use papervoice_speech::NormalizeOptions;
use papervoice_tts::{AudioFormat, OpenAiTts, TtsProvider};

/// Runtime settings resolved from the prepared config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub explain: ExplainSettings,
    pub speech_model: String,
    pub voice: String,
    pub format: AudioFormat,
    pub normalize: NormalizeOptions,
    pub bind_address: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub log_json: bool,
}

impl Config {
    /// The config file to read: `--config` when given, else the standard location.
    pub fn path(explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| config_file_path(&config_dir()))
    }

    /// Flatten a prepared [`PaperVoiceConfig`]; missing values fall back to the built-in defaults.
    pub fn from_file(file: PaperVoiceConfig) -> Result<Self> {
        let openai = file.openai.unwrap_or_default();
        let explain = file.explain.unwrap_or_default();
        let SpeechConfig { model, voice, format } = file.speech.unwrap_or_default();
        let NormalizeConfig {
            max_chars,
            strip_citations,
            heading_pauses,
        } = file.normalize.unwrap_or_default();
        let ServerConfig {
            bind,
            port,
            allowed_origins,
        } = file.server.unwrap_or_default();
        let LoggingConfig { level, dir, json } = file.logging.unwrap_or_default();

        let explain_defaults = ExplainSettings::default();
        let normalize_defaults = NormalizeOptions::default();
        let format = match format {
            Some(name) => name.parse().context("Invalid speech.format")?,
            None => AudioFormat::default(),
        };

        Ok(Self {
            api_key: openai.api_key.filter(|key| !key.trim().is_empty()),
            base_url: openai
                .base_url
                .unwrap_or_else(|| papervoice_config::defaults::DEFAULT_BASE_URL.to_string()),
            explain: ExplainSettings {
                model: explain.model.unwrap_or(explain_defaults.model),
                max_tokens: explain.max_tokens.unwrap_or(explain_defaults.max_tokens),
                system_prompt: explain.system_prompt.unwrap_or(explain_defaults.system_prompt),
                prompt_prefix: explain.prompt_prefix.unwrap_or(explain_defaults.prompt_prefix),
            },
            speech_model: model.unwrap_or_else(|| papervoice_tts::engine::DEFAULT_MODEL.to_string()),
            voice: voice.unwrap_or_else(|| papervoice_tts::engine::DEFAULT_VOICE.to_string()),
            format,
            normalize: NormalizeOptions {
                strip_citations: strip_citations.unwrap_or(normalize_defaults.strip_citations),
                heading_pauses: heading_pauses.unwrap_or(normalize_defaults.heading_pauses),
                max_chars: max_chars.unwrap_or(normalize_defaults.max_chars),
            },
            bind_address: bind.unwrap_or_else(|| papervoice_config::defaults::DEFAULT_BIND.to_string()),
            port: port.unwrap_or(papervoice_config::defaults::DEFAULT_PORT),
            allowed_origins,
            log_level: level.unwrap_or_else(|| papervoice_config::defaults::DEFAULT_LOG_LEVEL.to_string()),
            log_dir: dir.map(PathBuf::from),
            log_json: json.unwrap_or(false),
        })
    }

    fn require_api_key(&self) -> Result<&str, VoiceError> {
        self.api_key.as_deref().ok_or_else(|| {
            VoiceError::Config("no OpenAI API key: set openai.apiKey or OPENAI_API_KEY".to_string())
        })
    }

    pub fn explainer(&self) -> Result<Explainer, VoiceError> {
        let provider = OpenAiProvider::new(self.require_api_key()?).with_base_url(&self.base_url);
        Ok(Explainer::new(Arc::new(provider), self.explain.clone()))
    }

    pub fn tts(&self) -> Result<Arc<dyn TtsProvider>, VoiceError> {
        let tts = OpenAiTts::new(self.require_api_key()?)
            .with_base_url(&self.base_url)
            .with_model(&self.speech_model)
            .with_voice(&self.voice);
        Ok(Arc::new(tts))
    }

    /// Explanation pipeline over the OpenAI chat and speech endpoints.
    pub fn pipeline(&self) -> Result<ExplainPipeline, VoiceError> {
        Ok(ExplainPipeline::new(self.explainer()?, self.tts()?)
            .with_normalize(self.normalize)
            .with_format(self.format))
    }
}
