use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Character budget for both the explanation prompt and the speech input.
pub const MAX_INPUT_CHARS: usize = 4096;

/// Keep the first `max` Unicode scalar values of `text`.
///
/// Never splits a multi-byte character; returns the input unchanged when it
/// already fits.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Final normalized text handed to speech synthesis.
///
/// Built once, capped at construction, and never mutated afterwards.
/// Deserializing goes through [`SpokenText::new`], so the cap holds there too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SpokenText(String);

impl<'de> Deserialize<'de> for SpokenText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl SpokenText {
    /// Cap `text` at [`MAX_INPUT_CHARS`] characters.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_limit(text, MAX_INPUT_CHARS)
    }

    pub fn with_limit(text: impl Into<String>, max_chars: usize) -> Self {
        let mut text = text.into();
        let keep = truncate_chars(&text, max_chars).len();
        text.truncate(keep);
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SpokenText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SpokenText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
