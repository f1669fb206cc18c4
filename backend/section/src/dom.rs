//! Minimal HTML tree.
//!
//! Good enough for rendered paper pages: tags are scanned with a regex,
//! void elements never take children, `script`/`style` bodies and comments
//! are skipped, and stray closing tags are ignored.

use std::sync::LazyLock;

use regex::Regex;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|<(/?)([A-Za-z][A-Za-z0-9:-]*)((?:[^>\x22']|\x22[^\x22]*\x22|'[^']*')*)>")
        .unwrap()
});
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#).unwrap()
});
static NUMERIC_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#([xX][0-9a-fA-F]+|[0-9]+);").unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];
/// Elements that start a new line when rendered.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "caption", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "nav", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text of all descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.push_text(out),
            }
        }
    }

    /// Like [`Element::text_content`], but block elements are separated by
    /// whitespace the way a browser lays them out.
    pub fn rendered_text(&self) -> String {
        let mut out = String::new();
        self.push_rendered(&mut out);
        out
    }

    fn push_rendered(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name.as_str()) => {
                    out.push('\n');
                    element.push_rendered(out);
                    out.push('\n');
                }
                Node::Element(element) => element.push_rendered(out),
            }
        }
    }

    /// First descendant (or self) with the given id.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find_by_id(id))
    }

    /// Drop every descendant element for which `remove` returns true.
    pub fn remove_where(&mut self, remove: &impl Fn(&Element) -> bool) {
        self.children.retain(|child| match child {
            Node::Element(element) => !remove(element),
            Node::Text(_) => true,
        });
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.remove_where(remove);
            }
        }
    }

    /// Replace every descendant element for which `replace` returns `Some` with that node.
    pub fn replace_where(&mut self, replace: &impl Fn(&Element) -> Option<Node>) {
        for child in &mut self.children {
            if let Node::Element(element) = child {
                match replace(element) {
                    Some(node) => *child = node,
                    None => element.replace_where(replace),
                }
            }
        }
    }
}

/// Parse an HTML document or fragment into a synthetic `#document` root.
pub fn parse_html(html: &str) -> Element {
    let mut stack = vec![Element::new("#document")];
    let mut cursor = 0;

    while let Some(caps) = TOKEN.captures_at(html, cursor) {
        let Some(found) = caps.get(0) else { break };
        push_text(&mut stack, &html[cursor..found.start()]);
        cursor = found.end();

        let Some(name) = caps.get(2) else {
            // Comment, doctype or processing instruction.
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let rest = caps.get(3).map_or("", |m| m.as_str());

        if closing {
            close_element(&mut stack, &name);
            continue;
        }

        let mut element = Element::new(name.clone());
        element.attrs = parse_attrs(rest);

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let end_tag = format!("</{name}");
            let body_end = find_ignore_case(html, cursor, &end_tag).unwrap_or(html.len());
            cursor = html[body_end..].find('>').map_or(html.len(), |gt| body_end + gt + 1);
            attach(&mut stack, element);
            continue;
        }

        if VOID_ELEMENTS.contains(&name.as_str()) || rest.trim_end().ends_with('/') {
            attach(&mut stack, element);
        } else {
            stack.push(element);
        }
    }
    push_text(&mut stack, &html[cursor..]);

    while stack.len() > 1 {
        if let Some(open) = stack.pop() {
            attach(&mut stack, open);
        }
    }
    stack.pop().unwrap_or_else(|| Element::new("#document"))
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    let raw = raw.trim().trim_end_matches('/');
    ATTR.captures_iter(raw)
        .map(|caps| {
            let key = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or(String::new(), |m| decode_html_entities(m.as_str()));
            (key, value)
        })
        .collect()
}

fn push_text(stack: &mut [Element], raw: &str) {
    if raw.is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Text(decode_html_entities(raw)));
    }
}

fn attach(stack: &mut [Element], element: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
    }
}

/// Pop up to and including the nearest open `name`; ignore the tag if none is open.
fn close_element(stack: &mut Vec<Element>, name: &str) {
    let Some(depth) = stack.iter().skip(1).rposition(|open| open.name == name) else {
        return;
    };
    let target = depth + 1;
    while stack.len() > target {
        if let Some(open) = stack.pop() {
            attach(stack, open);
        }
    }
}

fn find_ignore_case(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let lower = haystack[from..].to_ascii_lowercase();
    lower.find(needle).map(|pos| from + pos)
}

/// Decode named entities common in paper pages, plus numeric references.
pub fn decode_html_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let named = s
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        value
            .and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    });
    // Last, so "&amp;lt;" stays "&lt;".
    numeric.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements() {
        let root = parse_html(r#"<div id="S1"><h2>Intro</h2><p>Hello <b>world</b></p></div>"#);
        let div = root.find_by_id("S1").unwrap();
        assert!(div.is("div"));
        assert_eq!(div.child_elements().count(), 2);
        assert_eq!(div.text_content(), "IntroHello world");
        assert_eq!(div.rendered_text(), "\nIntro\n\nHello world\n");
    }

    #[test]
    fn void_and_self_closing_elements_take_no_children() {
        let root = parse_html("<p>a<br>b<img src='x.png'/>c</p>");
        let p = root.child_elements().next().unwrap();
        assert_eq!(p.text_content(), "abc");
        assert_eq!(p.child_elements().count(), 2);
    }

    #[test]
    fn attributes_are_decoded() {
        let root = parse_html(r#"<math alttext="a&lt;b" display=inline data-x='1'></math>"#);
        let math = root.child_elements().next().unwrap();
        assert_eq!(math.attr("alttext"), Some("a<b"));
        assert_eq!(math.attr("display"), Some("inline"));
        assert_eq!(math.attr("data-x"), Some("1"));
    }

    #[test]
    fn attribute_values_may_contain_angle_brackets() {
        let root = parse_html(r#"<math alttext="a>b"><mi>a</mi></math>"#);
        let math = root.child_elements().next().unwrap();
        assert_eq!(math.attr("alttext"), Some("a>b"));
        assert_eq!(math.text_content(), "a");
    }

    #[test]
    fn skips_scripts_and_comments() {
        let root = parse_html("<p>one<!-- hidden --><script>var x = '<p>';</script>two</p>");
        assert_eq!(root.text_content(), "onetwo");
    }

    #[test]
    fn stray_closing_tags_are_ignored() {
        let root = parse_html("<div>a</span>b</div>c");
        assert_eq!(root.text_content(), "abc");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(decode_html_entities("a &amp; b"), "a & b");
        assert_eq!(decode_html_entities("&#945;&#x3B2;"), "αβ");
        assert_eq!(decode_html_entities("x&nbsp;y"), "x y");
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    }
}
