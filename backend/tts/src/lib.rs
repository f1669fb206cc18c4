pub mod engine;
pub mod mock;
pub mod narrate;
pub mod request;

pub use engine::{AudioFormat, OpenAiTts, TtsProvider, TtsRequest};
pub use mock::MockTts;
pub use narrate::{chunk_blocks, narrate, write_audio};
pub use request::{speak, SpeechOutput};
