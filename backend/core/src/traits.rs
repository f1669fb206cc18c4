use anyhow::Result;
use async_trait::async_trait;

/// Trait for chat-completion providers used to explain a section.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai", "mock").
    fn name(&self) -> &str;

    /// Send a completion request and return the first answer.
    ///
    /// A response without any choice is reported as
    /// [`VoiceError::ExplanationUnavailable`](crate::VoiceError::ExplanationUnavailable).
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Capability to flatten a document section into prompt text.
///
/// Keeps the explain pipeline independent of any particular document
/// model; the HTML adapter lives in `papervoice-section`.
pub trait SectionText {
    type Section: ?Sized;

    /// Collapse the section into one line of plain text, math replaced by its alt-text.
    fn collect_text(&self, section: &Self::Section) -> String;
}
