use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::engine::{TtsProvider, TtsRequest};

/// A mock TTS provider that echoes canned audio and records every input.
pub struct MockTts {
    audio: Bytes,
    failure: Option<String>,
    inputs: Mutex<Vec<String>>,
}

impl MockTts {
    pub fn new() -> Self {
        Self {
            audio: Bytes::from_static(b"ID3mock"),
            failure: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_audio(mut self, audio: impl Into<Bytes>) -> Self {
        self.audio = audio.into();
        self
    }

    /// Every call fails with this message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Texts received so far, in call order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for MockTts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtsProvider for MockTts {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, req: TtsRequest) -> Result<Bytes> {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(req.text);
        match &self.failure {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.audio.clone()),
        }
    }
}
