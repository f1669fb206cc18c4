//! Section snapshot: interactive controls out, math replaced by its alt-text.

use papervoice_core::SectionText;

use crate::dom::{Element, Node};

/// Elements whose text must never reach the prompt.
const INTERACTIVE: &[&str] = &["button", "input", "select", "textarea"];

/// [`SectionText`] over the HTML tree from [`crate::parse_html`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSectionExtractor;

impl HtmlSectionExtractor {
    /// Deep copy of `section` with controls removed and `<math>` swapped for its `alttext`.
    pub fn snapshot(&self, section: &Element) -> Element {
        let mut copy = section.clone();
        copy.remove_where(&|element: &Element| INTERACTIVE.iter().any(|tag| element.is(tag)));
        copy.replace_where(&|element: &Element| {
            element
                .is("math")
                .then(|| Node::Text(element.attr("alttext").unwrap_or_default().to_string()))
        });
        copy
    }
}

impl SectionText for HtmlSectionExtractor {
    type Section = Element;

    fn collect_text(&self, section: &Element) -> String {
        // A section that is itself a control or a math node.
        if INTERACTIVE.iter().any(|tag| section.is(tag)) {
            return String::new();
        }
        if section.is("math") {
            return collapse_whitespace(section.attr("alttext").unwrap_or_default());
        }
        collapse_whitespace(&self.snapshot(section).rendered_text())
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn first_element(html: &str) -> Element {
        parse_html(html).child_elements().next().cloned().unwrap()
    }

    #[test]
    fn math_alttext_replaces_markup_and_buttons_vanish() {
        let section = first_element(
            r#"<section><h2>Sum<button>Explain</button></h2>
               <p>We add <math alttext="x+y"><mi>x</mi><mo>+</mo><mi>y</mi></math> here.</p>
               </section>"#,
        );
        let text = HtmlSectionExtractor.collect_text(&section);
        assert_eq!(text, "Sum We add x+y here.");
        assert!(!text.contains("Explain"));
    }

    #[test]
    fn every_interactive_control_is_removed() {
        let section = first_element(
            "<div>a<input value='v'>b<select><option>opt</option></select>c<textarea>note</textarea></div>",
        );
        assert_eq!(HtmlSectionExtractor.collect_text(&section), "abc");
    }

    #[test]
    fn source_tree_is_untouched() {
        let section = first_element("<div><button>Explain</button>text</div>");
        let before = section.clone();
        let _ = HtmlSectionExtractor.collect_text(&section);
        assert_eq!(section, before);
    }

    #[test]
    fn whitespace_collapses_to_one_line() {
        let section = first_element("<p>\n  one\n\n\ttwo   three  \n</p>");
        assert_eq!(HtmlSectionExtractor.collect_text(&section), "one two three");
    }

    #[test]
    fn math_without_alttext_is_silent() {
        let section = first_element("<p>a <math><mi>z</mi></math> b</p>");
        assert_eq!(HtmlSectionExtractor.collect_text(&section), "a b");
    }

    #[test]
    fn degenerate_sections() {
        assert_eq!(HtmlSectionExtractor.collect_text(&first_element("<button>x</button>")), "");
        assert_eq!(
            HtmlSectionExtractor.collect_text(&first_element(r#"<math alttext=" a  b "></math>"#)),
            "a b"
        );
    }
}
