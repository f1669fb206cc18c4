//! `papervoice-speech`: turns model explanations into text a speech
//! engine can read aloud.
//!
//! - [`rules`]: the ordered, immutable rule table (inline math, scholarly
//!   abbreviations, citation cleanup)
//! - [`pattern`]: the matchers rules are built from
//! - [`pipeline`]: block-math blanking, inline-math rewriting, flattening,
//!   abbreviation expansion and truncation

pub mod pattern;
pub mod pipeline;
pub mod rules;

pub use pattern::{Index, Pattern};
pub use pipeline::{NormalizeOptions, Normalizer};
pub use rules::{Category, CleanupRule, Rule, RuleTable};
