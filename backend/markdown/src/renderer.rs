//! Renderers for the Markdown IR
//!
//! Transforms the AST into HTML for display next to a section. Math spans
//! carry the `math-block` / `math-inline` class markers page scripts look for.

use crate::ir::MarkdownNode;

/// Knobs for HTML rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Pass raw HTML through instead of escaping it.
    pub html_tags: bool,
    /// Keep the LaTeX source inside math spans.
    pub include_latex: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            html_tags: true,
            include_latex: true,
        }
    }
}

pub struct Renderer;

impl Renderer {
    /// Renders AST to HTML.
    pub fn to_html(nodes: &[MarkdownNode], options: RenderOptions) -> String {
        let mut out = String::new();
        for node in nodes {
            render_node(node, options, &mut out);
        }
        out
    }
}

fn render_children(children: &[MarkdownNode], options: RenderOptions, out: &mut String) {
    for child in children {
        render_node(child, options, out);
    }
}

fn wrap(tag: &str, children: &[MarkdownNode], options: RenderOptions, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    render_children(children, options, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_math(class: &str, latex: &str, options: RenderOptions, out: &mut String) {
    out.push_str("<span class=\"");
    out.push_str(class);
    out.push_str("\">");
    if options.include_latex {
        out.push_str(&escape_html(latex));
    }
    out.push_str("</span>");
}

fn render_node(node: &MarkdownNode, options: RenderOptions, out: &mut String) {
    match node {
        MarkdownNode::Heading(level, children) => {
            let level = (*level).clamp(1, 6);
            wrap(&format!("h{level}"), children, options, out);
            out.push('\n');
        }
        MarkdownNode::Paragraph(children) => {
            wrap("p", children, options, out);
            out.push('\n');
        }
        MarkdownNode::Text(text) => out.push_str(&escape_html(text)),
        MarkdownNode::CodeBlock(lang, content) => {
            if lang.is_empty() {
                out.push_str("<pre><code>");
            } else {
                out.push_str(&format!("<pre><code class=\"language-{}\">", escape_html(lang)));
            }
            out.push_str(&escape_html(content));
            out.push_str("</code></pre>\n");
        }
        MarkdownNode::List(None, children) => {
            wrap("ul", children, options, out);
            out.push('\n');
        }
        MarkdownNode::List(Some(1), children) => {
            wrap("ol", children, options, out);
            out.push('\n');
        }
        MarkdownNode::List(Some(start), children) => {
            out.push_str(&format!("<ol start=\"{start}\">"));
            render_children(children, options, out);
            out.push_str("</ol>\n");
        }
        MarkdownNode::ListItem(children) => wrap("li", children, options, out),
        MarkdownNode::Blockquote(children) => {
            wrap("blockquote", children, options, out);
            out.push('\n');
        }
        MarkdownNode::Emphasis(children) => wrap("em", children, options, out),
        MarkdownNode::Strong(children) => wrap("strong", children, options, out),
        MarkdownNode::Strikethrough(children) => wrap("del", children, options, out),
        MarkdownNode::Link(url, children) => {
            out.push_str(&format!("<a href=\"{}\">", escape_html(url)));
            render_children(children, options, out);
            out.push_str("</a>");
        }
        MarkdownNode::Image(url, alt) => {
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape_html(url),
                escape_html(alt)
            ));
        }
        MarkdownNode::InlineMath(latex) => render_math("math-inline", latex, options, out),
        MarkdownNode::DisplayMath(latex) => render_math("math-block", latex, options, out),
        MarkdownNode::Html(html) => {
            if options.html_tags {
                out.push_str(html);
            } else {
                out.push_str(&escape_html(html));
            }
        }
        MarkdownNode::LineBreak => out.push('\n'),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
