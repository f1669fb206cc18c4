use thiserror::Error;

/// Top-level error type for the papervoice pipeline.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// The model answered, but without a usable `choices[0].message.content`.
    #[error("explanation unavailable: {0}")]
    ExplanationUnavailable(String),

    #[error("a request for section '{0}' is already in flight")]
    RequestInFlight(String),

    #[error("provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("nothing to {0}: input is empty")]
    EmptyInput(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VoiceError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for failures of the upstream HTTP services (as opposed to bad input or state).
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Other(_))
    }
}
