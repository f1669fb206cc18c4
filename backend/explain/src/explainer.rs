//! Explanation requester: section text in, model markdown out.

use std::sync::Arc;

use papervoice_core::{truncate_chars, LlmProvider, LlmRequest, VoiceError, MAX_INPUT_CHARS};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_SYSTEM_PROMPT: &str = "Enclose all math expressions in dollar signs ($).";
pub const DEFAULT_PROMPT_PREFIX: &str = "Explain this:\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainSettings {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    /// Prepended to the section text in the user message.
    pub prompt_prefix: String,
}

impl Default for ExplainSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            prompt_prefix: DEFAULT_PROMPT_PREFIX.to_string(),
        }
    }
}

pub struct Explainer {
    provider: Arc<dyn LlmProvider>,
    settings: ExplainSettings,
}

impl Explainer {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: ExplainSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ExplainSettings {
        &self.settings
    }

    /// The chat request for one section; the user message is capped at the input budget.
    pub fn build_request(&self, section_text: &str) -> Result<LlmRequest, VoiceError> {
        if section_text.trim().is_empty() {
            return Err(VoiceError::EmptyInput("explain"));
        }
        let prompt = format!("{}{}", self.settings.prompt_prefix, section_text);
        Ok(LlmRequest {
            model: self.settings.model.clone(),
            system_prompt: self.settings.system_prompt.clone(),
            user_prompt: truncate_chars(&prompt, MAX_INPUT_CHARS).to_string(),
            max_tokens: self.settings.max_tokens,
        })
    }

    /// Ask the model once. No retry; failures are logged and returned.
    pub async fn explain(&self, section_text: &str) -> Result<String, VoiceError> {
        let request = self.build_request(section_text)?;
        let provider = self.provider.name().to_string();

        match self.provider.complete(&request).await {
            Ok(response) if response.content.trim().is_empty() => {
                error!(provider = %provider, "Explanation came back empty");
                Err(VoiceError::ExplanationUnavailable("empty answer".into()))
            }
            Ok(response) => {
                info!(
                    provider = %response.provider,
                    model = %response.model,
                    tokens = response.tokens_used,
                    latency_ms = response.latency_ms,
                    "Explanation received"
                );
                Ok(response.content)
            }
            Err(e) => {
                let e = classify(&provider, e);
                error!(provider = %provider, error = %e, "Explanation request failed");
                Err(e)
            }
        }
    }
}

/// Keep a typed [`VoiceError`] raised by the provider; wrap anything else as a provider failure.
fn classify(provider: &str, e: anyhow::Error) -> VoiceError {
    match e.downcast::<VoiceError>() {
        Ok(voice) => voice,
        Err(other) => VoiceError::provider(provider, format!("{other:#}")),
    }
}
