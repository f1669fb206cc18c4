//! Normalization pipeline: explanation markdown → spoken text.
//!
//! Block math collapses to a single ".", inline math goes through the math
//! rules, blocks are flattened into one line, then citation cleanup and
//! abbreviation expansion run over the whole string before truncation.
//!
//! Spoken text is itself valid input: characters that would read as
//! markdown on a second pass are defused, so normalizing twice changes
//! nothing.

use std::sync::LazyLock;

use papervoice_core::{truncate_chars, SpokenText, MAX_INPUT_CHARS};
use papervoice_markdown::{CodeBlockAnalyzer, IrParser, MarkdownNode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rules::RuleTable;

/// Spoken in place of a displayed equation.
const BLOCK_MATH_PLACEHOLDER: &str = ".";

/// `<b`, `</b`, `<!--`, `<http:`: would open a tag or autolink.
static TAG_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([A-Za-z/!?])").unwrap());
/// `&lt;`, `&#60;`: would decode as an entity.
static ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&(#?[A-Za-z0-9]+;)").unwrap());
/// `[a](b)`: would become a link.
static LINK_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\(").unwrap());
/// Heading, blockquote, bullet and thematic-break markers at the start of a line.
static LEADING_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[#>+\-]+(?:\s+|$)|>)+").unwrap());
/// `2. step` or `2) step` at the start of a line: an ordered list item.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,9})([.)])(\s|$)").unwrap());
/// `[3]: x` at the start of a line: a link reference definition.
static LEADING_DEFINITION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\[[^\]]*\]):").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Run the citation/URL cleanup rules before abbreviation expansion.
    pub strip_citations: bool,
    /// End headings with a period so the voice pauses after them.
    pub heading_pauses: bool,
    /// Output cap in characters.
    pub max_chars: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            strip_citations: false,
            heading_pauses: true,
            max_chars: MAX_INPUT_CHARS,
        }
    }
}

impl NormalizeOptions {
    /// Settings for reading a whole paper aloud.
    pub fn narration() -> Self {
        Self {
            strip_citations: true,
            ..Self::default()
        }
    }
}

/// One flattened block, before text rules.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    heading: bool,
    text: String,
}

pub struct Normalizer<'r> {
    rules: &'r RuleTable,
    options: NormalizeOptions,
}

impl Normalizer<'static> {
    /// Normalizer over the process-wide rule table.
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            rules: RuleTable::global(),
            options,
        }
    }
}

impl Default for Normalizer<'static> {
    fn default() -> Self {
        Self::new(NormalizeOptions::default())
    }
}

impl<'r> Normalizer<'r> {
    pub fn with_rules(rules: &'r RuleTable, options: NormalizeOptions) -> Self {
        Self { rules, options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Parse `markdown` and normalize it. Never fails; unknown syntax is read as text.
    pub fn normalize(&self, markdown: &str) -> SpokenText {
        self.normalize_nodes(IrParser::parse(markdown))
    }

    pub fn normalize_nodes(&self, nodes: Vec<MarkdownNode>) -> SpokenText {
        let math = nodes.iter().map(MarkdownNode::math_count).sum::<usize>();
        let blocks = self.flatten(nodes);
        let joined = blocks
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let text = finish_line(&self.rewrite(&joined), self.options.max_chars);
        let spoken = SpokenText::with_limit(text, self.options.max_chars);
        debug!(
            blocks = blocks.len(),
            math,
            chars = spoken.char_count(),
            "normalized explanation"
        );
        spoken
    }

    /// Normalize block by block, without truncation. Empty blocks are dropped.
    ///
    /// Used for narration, where the caller groups blocks into request-sized chunks.
    pub fn spoken_blocks(&self, markdown: &str) -> Vec<String> {
        self.flatten(IrParser::parse(markdown))
            .iter()
            .map(|block| self.rewrite(&block.text))
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Cleanup, then abbreviations, then markup defusing and a final whitespace collapse.
    fn rewrite(&self, text: &str) -> String {
        let text = if self.options.strip_citations {
            self.rules.apply_cleanup(text)
        } else {
            text.to_string()
        };
        defuse_line_start(&collapse(&defuse_markup(&self.rules.apply_text(&text))))
    }

    fn flatten(&self, nodes: Vec<MarkdownNode>) -> Vec<Block> {
        let nodes = CodeBlockAnalyzer::strip_for_tts(nodes);
        let mut blocks = Vec::new();
        self.collect_blocks(&nodes, false, &mut blocks);
        blocks.retain(|block| !block.text.is_empty());
        if self.options.heading_pauses {
            for block in blocks.iter_mut().filter(|block| block.heading) {
                if !block.text.ends_with(['.', '!', '?', ':']) {
                    block.text.push('.');
                }
            }
        }
        blocks
    }

    /// Walk a container: inline children accumulate into one block, block children recurse.
    fn collect_blocks(&self, nodes: &[MarkdownNode], heading: bool, blocks: &mut Vec<Block>) {
        let mut inline = String::new();
        for node in nodes {
            match node {
                MarkdownNode::Heading(_, children) => {
                    flush(&mut inline, heading, blocks);
                    self.collect_blocks(children, true, blocks);
                }
                MarkdownNode::Paragraph(children)
                | MarkdownNode::List(_, children)
                | MarkdownNode::ListItem(children)
                | MarkdownNode::Blockquote(children) => {
                    flush(&mut inline, heading, blocks);
                    self.collect_blocks(children, false, blocks);
                }
                // Labelled by `strip_for_tts`; anything left is not read.
                MarkdownNode::CodeBlock(..) => flush(&mut inline, heading, blocks),
                other => self.render_inline(other, &mut inline),
            }
        }
        flush(&mut inline, heading, blocks);
    }

    fn render_inline(&self, node: &MarkdownNode, out: &mut String) {
        match node {
            MarkdownNode::Text(text) => out.push_str(text),
            MarkdownNode::InlineMath(latex) => out.push_str(&self.rules.speak_math(latex)),
            MarkdownNode::DisplayMath(_) => {
                out.push(' ');
                out.push_str(BLOCK_MATH_PLACEHOLDER);
                out.push(' ');
            }
            MarkdownNode::Emphasis(children)
            | MarkdownNode::Strong(children)
            | MarkdownNode::Strikethrough(children)
            | MarkdownNode::Link(_, children) => {
                for child in children {
                    self.render_inline(child, out);
                }
            }
            MarkdownNode::Image(_, alt) => out.push_str(alt),
            MarkdownNode::LineBreak => out.push(' '),
            MarkdownNode::Html(_) => {}
            // Block nodes are handled by `collect_blocks`.
            _ => {}
        }
    }
}

fn flush(inline: &mut String, heading: bool, blocks: &mut Vec<Block>) {
    let text = collapse(inline);
    inline.clear();
    if !text.is_empty() {
        blocks.push(Block { heading, text });
    }
}

/// Cut to `max_chars` including the closing newline, never ending on a space.
fn finish_line(body: &str, max_chars: usize) -> String {
    let Some(budget) = max_chars.checked_sub(1) else {
        return String::new();
    };
    let mut line = truncate_chars(body, budget).trim_end().to_string();
    line.push('\n');
    line
}

/// Break up character runs that parse as inline markdown.
///
/// Emphasis, code and escape characters carry nothing speakable and become
/// spaces. `<`, `&` and `](` are kept but split from what follows.
fn defuse_markup(text: &str) -> String {
    let text: String = text
        .chars()
        .map(|c| match c {
            '*' | '_' | '`' | '~' | '\\' | '$' => ' ',
            other => other,
        })
        .collect();
    let text = TAG_OPEN.replace_all(&text, "< $1");
    let text = ENTITY.replace_all(&text, "& $1");
    LINK_TARGET.replace_all(&text, "] (").into_owned()
}

/// Drop block markers at the start of collapsed text and split list numbers from their dot.
fn defuse_line_start(text: &str) -> String {
    let text = LEADING_MARKERS.replace(text, "");
    let text = LEADING_NUMBER.replace(&text, "$1 $2$3");
    LEADING_DEFINITION.replace(&text, "$1 :").into_owned()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
