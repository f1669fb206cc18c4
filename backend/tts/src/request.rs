//! Speech request builder: spoken text in, audio bytes out.

use bytes::Bytes;
use papervoice_core::{SpokenText, VoiceError, MAX_INPUT_CHARS, truncate_chars};
use serde::Serialize;
use tracing::{error, info};

use crate::engine::{AudioFormat, TtsProvider, TtsRequest};

/// Audio returned for one spoken text.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechOutput {
    #[serde(skip)]
    pub audio: Bytes,
    /// MIME type (e.g. audio/mpeg)
    pub mime_type: &'static str,
    /// Number of characters synthesized
    pub char_count: usize,
}

/// Build the request for `spoken`, re-applying the character budget.
pub fn speech_request(spoken: &SpokenText, format: AudioFormat) -> TtsRequest {
    TtsRequest {
        text: truncate_chars(spoken.as_str(), MAX_INPUT_CHARS).to_string(),
        voice: None,
        format,
    }
}

/// Synthesize `spoken` once. No retry; failures are logged and returned.
pub async fn speak(
    provider: &dyn TtsProvider,
    spoken: &SpokenText,
    format: AudioFormat,
) -> Result<SpeechOutput, VoiceError> {
    if spoken.is_blank() {
        return Err(VoiceError::EmptyInput("speak"));
    }
    let request = speech_request(spoken, format);
    let char_count = request.text.chars().count();

    let audio = provider.synthesize(request).await.map_err(|e| {
        error!(provider = provider.name(), error = %e, "Speech synthesis failed");
        VoiceError::provider(provider.name(), format!("{e:#}"))
    })?;

    info!(provider = provider.name(), chars = char_count, bytes = audio.len(), "Speech ready");
    Ok(SpeechOutput {
        audio,
        mime_type: format.mime_type(),
        char_count,
    })
}
