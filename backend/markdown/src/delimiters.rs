//! Math delimiter normalization.
//!
//! Models are asked to wrap math in dollar signs but regularly answer with
//! `\( ... \)` and `\[ ... \]` instead. Both are rewritten to the dollar
//! forms the parser understands.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static INLINE_PAREN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\\\((.+?)\\\)").unwrap());
static DISPLAY_BRACKET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\\\[(.+?)\\\]").unwrap());

/// Rewrite `\(x\)` to `$x$` and `\[x\]` to `$$x$$`.
pub fn normalize_math_delimiters(markdown: &str) -> String {
    if !markdown.contains("\\(") && !markdown.contains("\\[") {
        return markdown.to_string();
    }
    let display = DISPLAY_BRACKET.replace_all(markdown, |caps: &Captures| {
        format!("$${}$$", caps[1].trim())
    });
    INLINE_PAREN
        .replace_all(&display, |caps: &Captures| format!("${}$", caps[1].trim()))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_inline_parens() {
        assert_eq!(normalize_math_delimiters(r"where \( x + 1 \) holds"), "where $x + 1$ holds");
    }

    #[test]
    fn rewrites_display_brackets() {
        assert_eq!(normalize_math_delimiters("\\[\na = b\n\\]"), "$$a = b$$");
    }

    #[test]
    fn leaves_dollar_math_alone() {
        let text = "already $x$ and $$y$$";
        assert_eq!(normalize_math_delimiters(text), text);
    }
}
