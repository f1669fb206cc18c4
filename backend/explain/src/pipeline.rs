//! Section text → explanation → spoken text → audio.

use std::sync::Arc;

use bytes::Bytes;
use papervoice_core::{SpokenText, VoiceError};
use papervoice_speech::{NormalizeOptions, Normalizer};
use papervoice_tts::{speak, AudioFormat, TtsProvider};
use serde::Serialize;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::explainer::Explainer;
use crate::session::{PendingGuard, SessionRegistry};

/// A model explanation and what will be read aloud.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub explanation: String,
    pub spoken: SpokenText,
}

pub struct ExplainPipeline {
    explainer: Explainer,
    tts: Arc<dyn TtsProvider>,
    normalize: NormalizeOptions,
    format: AudioFormat,
    sessions: Arc<SessionRegistry>,
}

impl ExplainPipeline {
    pub fn new(explainer: Explainer, tts: Arc<dyn TtsProvider>) -> Self {
        Self {
            explainer,
            tts,
            normalize: NormalizeOptions::default(),
            format: AudioFormat::default(),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    pub fn with_normalize(mut self, options: NormalizeOptions) -> Self {
        self.normalize = options;
        self
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Explain and normalize, without speech synthesis.
    pub async fn explain_text(&self, section_text: &str) -> Result<Explanation, VoiceError> {
        let explanation = self.explainer.explain(section_text).await?;
        let spoken = Normalizer::new(self.normalize).normalize(&explanation);
        if spoken.is_blank() {
            warn!("Explanation normalized to nothing speakable");
        }
        Ok(Explanation { explanation, spoken })
    }

    /// Full explain for one section, guarded by that section's session.
    ///
    /// Fails with [`VoiceError::RequestInFlight`] while an earlier request for
    /// the same `key` is outstanding. Dropping the returned future releases the section.
    pub async fn explain_audio(&self, key: &str, section_text: &str) -> Result<Bytes, VoiceError> {
        let pending = PendingGuard::begin(&self.sessions, key)?;
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("explain", section = %key, %request_id);

        let result = async {
            let explanation = self.explain_text(section_text).await?;
            let output = speak(self.tts.as_ref(), &explanation.spoken, self.format).await?;
            info!(chars = output.char_count, bytes = output.audio.len(), "Explanation spoken");
            Ok::<Bytes, VoiceError>(output.audio)
        }
        .instrument(span)
        .await;

        pending.resolve(result.as_ref().ok().cloned());
        result
    }
}
