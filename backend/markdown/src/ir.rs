//! Markdown Intermediate Representation
//!
//! Parses markdown syntax into a strongly-typed AST. Math is kept as its own
//! node kind so renderers can treat displayed equations and in-line
//! expressions differently.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};

use crate::delimiters::normalize_math_delimiters;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MarkdownNode {
    Heading(u32, Vec<MarkdownNode>),
    Paragraph(Vec<MarkdownNode>),
    Text(String),
    CodeBlock(String, String), // language, content
    /// Start number for ordered lists, `None` for bullets.
    List(Option<u64>, Vec<MarkdownNode>),
    ListItem(Vec<MarkdownNode>),
    Blockquote(Vec<MarkdownNode>),
    Emphasis(Vec<MarkdownNode>),
    Strong(Vec<MarkdownNode>),
    Strikethrough(Vec<MarkdownNode>),
    Link(String, Vec<MarkdownNode>), // url, label
    Image(String, String),           // url, alt_text
    /// `$...$`: spoken word by word.
    InlineMath(String),
    /// `$$...$$`: acknowledged, never read out.
    DisplayMath(String),
    Html(String),
    LineBreak,
}

impl MarkdownNode {
    /// Number of math regions (inline and displayed) below this node.
    pub fn math_count(&self) -> usize {
        match self {
            Self::InlineMath(_) | Self::DisplayMath(_) => 1,
            Self::Heading(_, children)
            | Self::Paragraph(children)
            | Self::List(_, children)
            | Self::ListItem(children)
            | Self::Blockquote(children)
            | Self::Emphasis(children)
            | Self::Strong(children)
            | Self::Strikethrough(children)
            | Self::Link(_, children) => children.iter().map(Self::math_count).sum(),
            _ => 0,
        }
    }
}

/// Open container while walking the event stream.
enum Frame {
    Root,
    Heading(u32),
    Paragraph,
    CodeBlock(String),
    List(Option<u64>),
    Item,
    Blockquote,
    Emphasis,
    Strong,
    Strikethrough,
    Link(String),
    Image(String),
    /// Tables, footnote definitions and the like: children are spliced into the parent.
    Transparent,
}

pub struct IrParser;

impl IrParser {
    /// Tokenizes markdown (with `$`, `$$`, `\(`, `\[` math) into the IR.
    pub fn parse(markdown: &str) -> Vec<MarkdownNode> {
        let source = normalize_math_delimiters(markdown);
        let options = Options::ENABLE_MATH | Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(&source, options);

        let mut stack: Vec<(Frame, Vec<MarkdownNode>)> = vec![(Frame::Root, Vec::new())];

        for event in parser {
            match event {
                Event::Start(tag) => {
                    let frame = match tag {
                        Tag::Paragraph => Frame::Paragraph,
                        Tag::Heading { level, .. } => Frame::Heading(level as u32),
                        Tag::BlockQuote(_) => Frame::Blockquote,
                        Tag::CodeBlock(CodeBlockKind::Fenced(lang)) => Frame::CodeBlock(lang.to_string()),
                        Tag::CodeBlock(CodeBlockKind::Indented) => Frame::CodeBlock(String::new()),
                        Tag::List(start) => Frame::List(start),
                        Tag::Item => Frame::Item,
                        Tag::Emphasis => Frame::Emphasis,
                        Tag::Strong => Frame::Strong,
                        Tag::Strikethrough => Frame::Strikethrough,
                        Tag::Link { dest_url, .. } => Frame::Link(dest_url.to_string()),
                        Tag::Image { dest_url, .. } => Frame::Image(dest_url.to_string()),
                        _ => Frame::Transparent,
                    };
                    stack.push((frame, Vec::new()));
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        continue;
                    }
                    let Some((frame, children)) = stack.pop() else { break };
                    let Some((_, parent)) = stack.last_mut() else { break };
                    close_frame(frame, children, parent);
                }
                Event::Text(text) | Event::Code(text) => push_text(&mut stack, &text),
                Event::InlineMath(math) => push_node(&mut stack, MarkdownNode::InlineMath(math.to_string())),
                Event::DisplayMath(math) => push_node(&mut stack, MarkdownNode::DisplayMath(math.to_string())),
                Event::Html(html) | Event::InlineHtml(html) => push_node(&mut stack, MarkdownNode::Html(html.to_string())),
                Event::SoftBreak | Event::HardBreak => push_node(&mut stack, MarkdownNode::LineBreak),
                _ => {}
            }
        }

        // Unbalanced streams should not happen, but never drop content.
        while stack.len() > 1 {
            let Some((frame, children)) = stack.pop() else { break };
            let Some((_, parent)) = stack.last_mut() else { break };
            close_frame(frame, children, parent);
        }

        stack.pop().map(|(_, nodes)| nodes).unwrap_or_default()
    }
}

fn push_node(stack: &mut [(Frame, Vec<MarkdownNode>)], node: MarkdownNode) {
    if let Some((_, children)) = stack.last_mut() {
        children.push(node);
    }
}

/// Append text, merging with a preceding text node so inline runs stay whole.
fn push_text(stack: &mut [(Frame, Vec<MarkdownNode>)], text: &str) {
    if let Some((_, children)) = stack.last_mut() {
        if let Some(MarkdownNode::Text(last)) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(MarkdownNode::Text(text.to_string()));
        }
    }
}

fn close_frame(frame: Frame, children: Vec<MarkdownNode>, parent: &mut Vec<MarkdownNode>) {
    let node = match frame {
        Frame::Root => return parent.extend(children),
        Frame::Transparent => return parent.extend(children),
        Frame::Heading(level) => MarkdownNode::Heading(level, children),
        Frame::Paragraph => MarkdownNode::Paragraph(children),
        Frame::CodeBlock(lang) => MarkdownNode::CodeBlock(lang, text_of(&children)),
        Frame::List(start) => MarkdownNode::List(start, children),
        Frame::Item => MarkdownNode::ListItem(children),
        Frame::Blockquote => MarkdownNode::Blockquote(children),
        Frame::Emphasis => MarkdownNode::Emphasis(children),
        Frame::Strong => MarkdownNode::Strong(children),
        Frame::Strikethrough => MarkdownNode::Strikethrough(children),
        Frame::Link(url) => MarkdownNode::Link(url, children),
        Frame::Image(url) => MarkdownNode::Image(url, text_of(&children)),
    };
    parent.push(node);
}

fn text_of(nodes: &[MarkdownNode]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            MarkdownNode::Text(text) => text.clone(),
            MarkdownNode::InlineMath(math) | MarkdownNode::DisplayMath(math) => math.clone(),
            _ => String::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paragraph_with_inline_math() {
        let nodes = IrParser::parse("The ratio $\\frac{1}{2}$ is small.");
        assert_eq!(
            nodes,
            vec![MarkdownNode::Paragraph(vec![
                MarkdownNode::Text("The ratio ".into()),
                MarkdownNode::InlineMath("\\frac{1}{2}".into()),
                MarkdownNode::Text(" is small.".into()),
            ])]
        );
    }

    #[test]
    fn display_math_is_its_own_node() {
        let nodes = IrParser::parse("Consider\n\n$$\\int_0^1 f(x)\\,dx$$\n");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].math_count(), 1);
        let MarkdownNode::Paragraph(children) = &nodes[1] else {
            panic!("expected paragraph, got {:?}", nodes[1]);
        };
        assert!(matches!(children[0], MarkdownNode::DisplayMath(_)));
    }

    #[test]
    fn bracket_delimiters_become_math() {
        let nodes = IrParser::parse("Let \\(x^2\\) grow.");
        let MarkdownNode::Paragraph(children) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(children[1], MarkdownNode::InlineMath("x^2".into()));
    }

    #[test]
    fn headings_and_lists() {
        let nodes = IrParser::parse("## Results\n\n- first\n- second\n");
        assert_eq!(
            nodes[0],
            MarkdownNode::Heading(2, vec![MarkdownNode::Text("Results".into())])
        );
        let MarkdownNode::List(None, items) = &nodes[1] else {
            panic!("expected bullet list");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn ordered_lists_keep_their_start() {
        let nodes = IrParser::parse("3. third
4. fourth
");
        assert!(matches!(&nodes[0], MarkdownNode::List(Some(3), items) if items.len() == 2));
    }

    #[test]
    fn strong_and_strikethrough_are_distinct() {
        let nodes = IrParser::parse("*a* **b** ~~c~~");
        let MarkdownNode::Paragraph(children) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert!(matches!(children[0], MarkdownNode::Emphasis(_)));
        assert!(matches!(children[2], MarkdownNode::Strong(_)));
        assert!(matches!(children[4], MarkdownNode::Strikethrough(_)));
    }

    #[test]
    fn code_block_keeps_language_and_content() {
        let nodes = IrParser::parse("```rust\nlet x = 1;\n```\n");
        assert_eq!(
            nodes,
            vec![MarkdownNode::CodeBlock("rust".into(), "let x = 1;\n".into())]
        );
    }

    #[test]
    fn empty_input_yields_no_nodes() {
        assert!(IrParser::parse("").is_empty());
    }
}
