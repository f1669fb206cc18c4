//! Section explanations for papervoice.
//!
//! - [`explainer`]: builds the chat request for a section and reads the answer
//! - [`providers`]: chat-completion back ends (OpenAI, mock)
//! - [`session`]: the per-section at-most-one-request state machine
//! - [`pipeline`]: explanation → normalization → speech, per section

pub mod explainer;
pub mod pipeline;
pub mod providers;
pub mod session;

pub use explainer::{ExplainSettings, Explainer};
pub use pipeline::{ExplainPipeline, Explanation};
pub use providers::{MockProvider, OpenAiProvider};
pub use session::{PendingGuard, SectionSession, SessionRegistry, SessionState, SessionStatus};
