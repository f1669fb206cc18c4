//! Config validation: checks with user-friendly error messages.

use crate::defaults::DEFAULT_MAX_CHARS;
use crate::schema::PaperVoiceConfig;
use thiserror::Error;

const AUDIO_FORMATS: &[&str] = &["mp3", "opus", "aac", "flac", "wav", "pcm"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PaperVoiceConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_openai(config, &mut report);
    validate_explain(config, &mut report);
    validate_speech(config, &mut report);
    validate_normalize(config, &mut report);
    validate_server(config, &mut report);
    report
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn validate_openai(config: &PaperVoiceConfig, report: &mut ValidationReport) {
    let openai = config.openai.as_ref();
    if is_blank(openai.and_then(|o| o.api_key.as_deref())) {
        report.warn(
            "openai.apiKey",
            "No API key configured; only offline normalization will work",
        );
    }
    if let Some(url) = openai.and_then(|o| o.base_url.as_deref()) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("openai.baseUrl", format!("'{url}' is not an http(s) URL"));
        }
    }
}

fn validate_explain(config: &PaperVoiceConfig, report: &mut ValidationReport) {
    let Some(explain) = &config.explain else { return };
    if explain.model.is_some() && is_blank(explain.model.as_deref()) {
        report.error("explain.model", "Model cannot be empty");
    }
    if explain.max_tokens == Some(0) {
        report.error("explain.maxTokens", "maxTokens must be >= 1");
    }
}

fn validate_speech(config: &PaperVoiceConfig, report: &mut ValidationReport) {
    let Some(speech) = &config.speech else { return };
    if speech.voice.is_some() && is_blank(speech.voice.as_deref()) {
        report.error("speech.voice", "Voice cannot be empty");
    }
    if let Some(format) = &speech.format {
        if !AUDIO_FORMATS.contains(&format.to_ascii_lowercase().as_str()) {
            report.error(
                "speech.format",
                format!("Unknown audio format '{format}'. Use one of: {}", AUDIO_FORMATS.join(", ")),
            );
        }
    }
}

fn validate_normalize(config: &PaperVoiceConfig, report: &mut ValidationReport) {
    let Some(max_chars) = config.normalize.as_ref().and_then(|n| n.max_chars) else { return };
    if max_chars == 0 {
        report.error("normalize.maxChars", "maxChars must be >= 1");
    } else if max_chars > DEFAULT_MAX_CHARS {
        report.warn(
            "normalize.maxChars",
            format!("maxChars {max_chars} exceeds the speech endpoint limit of {DEFAULT_MAX_CHARS}"),
        );
    }
}

fn validate_server(config: &PaperVoiceConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if let Some(port) = server.port {
        if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "server.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if server.bind.is_some() && is_blank(server.bind.as_deref()) {
        report.error("server.bind", "Bind address cannot be empty");
    }
}
