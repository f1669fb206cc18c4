//! Turns sections of a rendered paper page into prompt text.
//!
//! [`parse_html`] builds a small element tree, [`explainable_sections`]
//! finds the sections a reader can ask about, and [`HtmlSectionExtractor`]
//! implements [`papervoice_core::SectionText`] for them.

pub mod dom;
pub mod extractor;
pub mod sections;

pub use dom::{decode_html_entities, parse_html, Element, Node};
pub use extractor::HtmlSectionExtractor;
pub use sections::{explainable_sections, ExplainableSection, SectionSelector, EXPLAINABLE_HEADINGS};
