//! Markdown Intermediate Representation Parser and Renderers
//!
//! Converts markdown answers originating from LLMs (with embedded LaTeX)
//! into a typed tree whose block-math and inline-math regions can be told
//! apart, for the speech normalizer and for HTML display.

pub mod code_block;
pub mod delimiters;
pub mod ir;
pub mod renderer;

pub use code_block::CodeBlockAnalyzer;
pub use delimiters::normalize_math_delimiters;
pub use ir::{IrParser, MarkdownNode};
pub use renderer::{RenderOptions, Renderer};
