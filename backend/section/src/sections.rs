//! Explainable sections of a rendered paper page.
//!
//! Every `h2`, `h3`, `h4` and `h6` heading marks a section: its parent
//! element, the node the page script attaches the explain button to.

use std::fmt;
use std::str::FromStr;

use papervoice_core::SectionText;
use serde::Serialize;
use tracing::debug;

use crate::dom::Element;
use crate::extractor::HtmlSectionExtractor;

pub const EXPLAINABLE_HEADINGS: &[&str] = &["h2", "h3", "h4", "h6"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainableSection {
    /// Position in document order, starting at 0.
    pub index: usize,
    pub heading: String,
    pub level: u8,
    /// `id` of the parent element, when it has one.
    pub id: Option<String>,
    /// The parent element itself.
    #[serde(skip)]
    pub element: Element,
}

impl ExplainableSection {
    /// Stable key for session bookkeeping: the element id, or `#<index>`.
    pub fn key(&self) -> String {
        self.id.clone().unwrap_or_else(|| format!("#{}", self.index))
    }

    pub fn text(&self) -> String {
        HtmlSectionExtractor.collect_text(&self.element)
    }
}

/// Collect every explainable section, in document order.
pub fn explainable_sections(root: &Element) -> Vec<ExplainableSection> {
    let mut sections = Vec::new();
    visit(root, &mut sections);
    debug!(count = sections.len(), "found explainable sections");
    sections
}

fn visit(parent: &Element, sections: &mut Vec<ExplainableSection>) {
    for child in parent.child_elements() {
        if let Some(level) = heading_level(child) {
            sections.push(ExplainableSection {
                index: sections.len(),
                heading: HtmlSectionExtractor.collect_text(child),
                level,
                id: parent.id().map(str::to_string),
                element: parent.clone(),
            });
        }
        visit(child, sections);
    }
}

fn heading_level(element: &Element) -> Option<u8> {
    EXPLAINABLE_HEADINGS
        .iter()
        .find(|tag| element.is(tag))
        .and_then(|tag| tag[1..].parse().ok())
}

/// How a caller names a section: by position or by element id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSelector {
    Index(usize),
    Id(String),
}

impl FromStr for SectionSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Id(s.trim().trim_start_matches('#').to_string()),
        })
    }
}

impl fmt::Display for SectionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}

impl SectionSelector {
    pub fn select<'a>(&self, sections: &'a [ExplainableSection]) -> Option<&'a ExplainableSection> {
        match self {
            Self::Index(index) => sections.get(*index),
            Self::Id(id) => sections.iter().find(|section| section.id.as_deref() == Some(id.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    const PAGE: &str = r#"
        <article>
          <h1>Title</h1>
          <section id="S1"><h2>1 Introduction</h2><p>We study <math alttext="f(x)">f</math>.</p>
            <section id="S1.SS1"><h3>1.1 Setup</h3><p>Details.</p></section>
          </section>
          <div><h5>Skipped</h5></div>
          <div class="para"><h6>Remark</h6><p>Anonymous.</p></div>
        </article>"#;

    #[test]
    fn finds_supported_headings_in_document_order() {
        let root = parse_html(PAGE);
        let sections = explainable_sections(&root);
        let headings: Vec<_> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["1 Introduction", "1.1 Setup", "Remark"]);
        assert_eq!(sections[0].level, 2);
        assert_eq!(sections[2].level, 6);
    }

    #[test]
    fn section_is_the_heading_parent() {
        let root = parse_html(PAGE);
        let sections = explainable_sections(&root);
        assert_eq!(sections[0].id.as_deref(), Some("S1"));
        assert!(sections[0].text().starts_with("1 Introduction We study f(x)."));
        assert!(sections[0].text().ends_with("Details."));
        assert_eq!(sections[2].id, None);
        assert_eq!(sections[2].key(), "#2");
    }

    #[test]
    fn selectors() {
        let root = parse_html(PAGE);
        let sections = explainable_sections(&root);

        let by_index: SectionSelector = "1".parse().unwrap();
        assert_eq!(by_index.select(&sections).unwrap().heading, "1.1 Setup");

        let by_id: SectionSelector = "#S1.SS1".parse().unwrap();
        assert_eq!(by_id, SectionSelector::Id("S1.SS1".into()));
        assert_eq!(by_id.select(&sections).unwrap().index, 1);

        let missing: SectionSelector = "S9".parse().unwrap();
        assert!(missing.select(&sections).is_none());
    }
}
