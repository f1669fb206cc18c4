pub mod error;
pub mod traits;
pub mod types;

pub use error::VoiceError;
pub use traits::{LlmProvider, LlmRequest, LlmResponse, SectionText};
pub use types::{truncate_chars, SpokenText, MAX_INPUT_CHARS};
