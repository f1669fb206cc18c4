//! Code Block Semantic Utility
//!
//! Finds code blocks in an explanation and swaps them for a short spoken
//! label before speech synthesis.

use crate::ir::MarkdownNode;

pub struct CodeBlockAnalyzer;

impl CodeBlockAnalyzer {
    /// Replaces code blocks with a descriptive "code example" label for TTS pipelines.
    pub fn strip_for_tts(nodes: Vec<MarkdownNode>) -> Vec<MarkdownNode> {
        nodes
            .into_iter()
            .map(|node| match node {
                MarkdownNode::CodeBlock(lang, _) => {
                    let label = if lang.is_empty() {
                        "A code example is omitted.".to_string()
                    } else {
                        format!("A {lang} code example is omitted.")
                    };
                    MarkdownNode::Paragraph(vec![MarkdownNode::Text(label)])
                }
                MarkdownNode::List(start, children) => MarkdownNode::List(start, Self::strip_for_tts(children)),
                MarkdownNode::ListItem(children) => MarkdownNode::ListItem(Self::strip_for_tts(children)),
                MarkdownNode::Blockquote(children) => {
                    MarkdownNode::Blockquote(Self::strip_for_tts(children))
                }
                other => other,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrParser;

    #[test]
    fn nested_code_is_labelled() {
        let nodes = IrParser::parse("- item\n\n  ```py\n  x = 1\n  ```\n");
        let stripped = CodeBlockAnalyzer::strip_for_tts(nodes);
        let MarkdownNode::List(None, items) = &stripped[0] else {
            panic!("expected list, got {stripped:?}");
        };
        let MarkdownNode::ListItem(children) = &items[0] else {
            panic!("expected item");
        };
        assert!(children.contains(&MarkdownNode::Paragraph(vec![MarkdownNode::Text(
            "A py code example is omitted.".into()
        )])));
    }

    #[test]
    fn code_becomes_spoken_label() {
        let nodes = vec![MarkdownNode::CodeBlock("rust".into(), "fn main() {}".into())];
        let stripped = CodeBlockAnalyzer::strip_for_tts(nodes);
        assert_eq!(
            stripped,
            vec![MarkdownNode::Paragraph(vec![MarkdownNode::Text(
                "A rust code example is omitted.".into()
            )])]
        );
    }
}
