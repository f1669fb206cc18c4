//! Config defaults: fills every section so callers read concrete values.

use crate::schema::{
    ExplainConfig, LoggingConfig, NormalizeConfig, OpenAiConfig, PaperVoiceConfig, ServerConfig,
    SpeechConfig,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EXPLAIN_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_SYSTEM_PROMPT: &str = "Enclose all math expressions in dollar signs ($).";
pub const DEFAULT_PROMPT_PREFIX: &str = "Explain this:\n";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_VOICE: &str = "echo";
pub const DEFAULT_FORMAT: &str = "mp3";
/// Character budget shared by the prompt and the speech input.
pub const DEFAULT_MAX_CHARS: usize = 4096;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: PaperVoiceConfig) -> PaperVoiceConfig {
    let config = apply_openai_defaults(config);
    let config = apply_explain_defaults(config);
    let config = apply_speech_defaults(config);
    let config = apply_normalize_defaults(config);
    let config = apply_server_defaults(config);
    apply_logging_defaults(config)
}

fn fill<T>(slot: &mut Option<T>, value: impl FnOnce() -> T) {
    if slot.is_none() {
        *slot = Some(value());
    }
}

fn apply_openai_defaults(mut config: PaperVoiceConfig) -> PaperVoiceConfig {
    let openai = config.openai.get_or_insert_with(OpenAiConfig::default);
    fill(&mut openai.base_url, || DEFAULT_BASE_URL.to_string());
    config
}

fn apply_explain_defaults(mut config: PaperVoiceConfig) -> PaperVoiceConfig {
    let explain = config.explain.get_or_insert_with(ExplainConfig::default);
    fill(&mut explain.model, || DEFAULT_EXPLAIN_MODEL.to_string());
    fill(&mut explain.max_tokens, || DEFAULT_MAX_TOKENS);
    fill(&mut explain.system_prompt, || DEFAULT_SYSTEM_PROMPT.to_string());
    fill(&mut explain.prompt_prefix, || DEFAULT_PROMPT_PREFIX.to_string());
    config
}

fn apply_speech_defaults(mut config: PaperVoiceConfig) -> PaperVoiceConfig {
    let speech = config.speech.get_or_insert_with(SpeechConfig::default);
    fill(&mut speech.model, || DEFAULT_SPEECH_MODEL.to_string());
    fill(&mut speech.voice, || DEFAULT_VOICE.to_string());
    fill(&mut speech.format, || DEFAULT_FORMAT.to_string());
    config
}

/// Citation stripping stays off here; `narrate` always turns it on.
fn apply_normalize_defaults(mut config: PaperVoiceConfig) -> PaperVoiceConfig {
    let normalize = config.normalize.get_or_insert_with(NormalizeConfig::default);
    fill(&mut normalize.max_chars, || DEFAULT_MAX_CHARS);
    fill(&mut normalize.heading_pauses, || true);
    config
}

fn apply_server_defaults(mut config: PaperVoiceConfig) -> PaperVoiceConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    fill(&mut server.bind, || DEFAULT_BIND.to_string());
    fill(&mut server.port, || DEFAULT_PORT);
    config
}

fn apply_logging_defaults(mut config: PaperVoiceConfig) -> PaperVoiceConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    fill(&mut logging.level, || DEFAULT_LOG_LEVEL.to_string());
    fill(&mut logging.json, || false);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_page_script_defaults() {
        let cfg = apply_all_defaults(PaperVoiceConfig::default());
        let explain = cfg.explain.unwrap();
        assert_eq!(explain.model.as_deref(), Some("gpt-4o"));
        assert_eq!(explain.max_tokens, Some(1024));
        assert_eq!(explain.prompt_prefix.as_deref(), Some("Explain this:\n"));
        let speech = cfg.speech.unwrap();
        assert_eq!(speech.model.as_deref(), Some("tts-1"));
        assert_eq!(speech.voice.as_deref(), Some("echo"));
        let normalize = cfg.normalize.unwrap();
        assert_eq!(normalize.max_chars, Some(4096));
        assert_eq!(normalize.strip_citations, None);
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = PaperVoiceConfig::default();
        cfg.speech = Some(SpeechConfig {
            voice: Some("nova".into()),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        let speech = cfg.speech.unwrap();
        assert_eq!(speech.voice.as_deref(), Some("nova"));
        assert_eq!(speech.format.as_deref(), Some("mp3"));
    }

    #[test]
    fn api_key_has_no_default() {
        let cfg = apply_all_defaults(PaperVoiceConfig::default());
        assert!(cfg.openai.unwrap().api_key.is_none());
    }
}
