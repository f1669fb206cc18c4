//! Structured logging for papervoice.
//!
//! Console output on stderr (stdout carries command output), an optional
//! JSON rolling file, and redaction of API keys before anything that may
//! echo a request reaches a log line or a client.

pub mod logger;
pub mod redact;

pub use logger::{init_console_logger, init_logger};
pub use redact::redact_sensitive_data;
