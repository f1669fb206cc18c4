//! Matchers for replacement rules.
//!
//! Patterns are plain data rather than regex literals. Macro arguments are
//! read with a balanced-brace scanner, so `\frac{\sqrt{x}}{y}` captures
//! `\sqrt{x}` and `y` instead of stopping at the first `}`.

/// Optional `[...]` argument of a macro such as `\sqrt[3]{x}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    /// The macro must not carry an index.
    Absent,
    /// The index must equal this text.
    Exact(&'static str),
    /// Any alphanumeric index; captured as `$1`, shifting the brace arguments by one.
    Any,
}

/// What a rule looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Exact substring, anywhere.
    Literal(&'static str),
    /// Exact substring that is not glued to a preceding letter or digit.
    Word(&'static str),
    /// Control word `\name` not followed by another ASCII letter.
    Command(&'static str),
    /// Control word with brace arguments, e.g. `\frac{A}{B}`.
    Macro {
        command: &'static str,
        index: Index,
        args: usize,
    },
    /// Any run of whitespace.
    SpaceRun,
}

/// A successful match: how many bytes were consumed and what was captured.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Match<'a> {
    pub consumed: usize,
    pub captures: Vec<&'a str>,
}

impl Pattern {
    /// The fixed text every match starts with, if any.
    pub(crate) fn needle(&self) -> Option<String> {
        match self {
            Self::Literal(text) | Self::Word(text) => Some((*text).to_string()),
            Self::Command(name) => Some(format!("\\{name}")),
            Self::Macro { command, .. } => Some(format!("\\{command}")),
            Self::SpaceRun => None,
        }
    }

    /// Try to match at the start of `candidate`, which already begins with the needle.
    /// `previous` is the last character emitted before the candidate.
    pub(crate) fn match_at<'a>(&self, previous: Option<char>, candidate: &'a str) -> Option<Match<'a>> {
        match self {
            Self::Literal(text) => Some(Match {
                consumed: text.len(),
                captures: Vec::new(),
            }),
            Self::Word(text) => {
                if previous.is_some_and(|c| c.is_alphanumeric()) {
                    return None;
                }
                Some(Match {
                    consumed: text.len(),
                    captures: Vec::new(),
                })
            }
            Self::Command(name) => {
                let consumed = name.len() + 1;
                let next = candidate[consumed..].chars().next();
                if next.is_some_and(|c| c.is_ascii_alphabetic()) {
                    return None;
                }
                Some(Match {
                    consumed,
                    captures: Vec::new(),
                })
            }
            Self::Macro {
                command,
                index,
                args,
            } => match_macro(candidate, command, *index, *args),
            Self::SpaceRun => None,
        }
    }
}

fn match_macro<'a>(candidate: &'a str, command: &str, index: Index, args: usize) -> Option<Match<'a>> {
    let mut pos = command.len() + 1;
    let mut captures = Vec::with_capacity(args + 1);

    let rest = &candidate[pos..];
    match (index, rest.starts_with('[')) {
        (Index::Absent, true) => return None,
        (Index::Absent, false) => {}
        (_, false) => return None,
        (Index::Exact(expected), true) => {
            let (inner, used) = bracket_group(rest)?;
            if inner.trim() != expected {
                return None;
            }
            pos += used;
        }
        (Index::Any, true) => {
            let (inner, used) = bracket_group(rest)?;
            let inner = inner.trim();
            if inner.is_empty() || !inner.chars().all(|c| c.is_alphanumeric()) {
                return None;
            }
            captures.push(inner);
            pos += used;
        }
    }

    for n in 0..args {
        // Allow `\frac{a} {b}` but not `\frac {a}{b}`: the first group must follow directly.
        if n > 0 {
            pos += leading_spaces(&candidate[pos..]);
        }
        let (inner, used) = brace_group(&candidate[pos..])?;
        captures.push(inner);
        pos += used;
    }

    Some(Match {
        consumed: pos,
        captures,
    })
}

fn leading_spaces(s: &str) -> usize {
    s.len() - s.trim_start_matches(' ').len()
}

/// `[...]` without nesting. Returns the inner text and the bytes consumed.
fn bracket_group(s: &str) -> Option<(&str, usize)> {
    if !s.starts_with('[') {
        return None;
    }
    let close = s.find(']')?;
    Some((&s[1..close], close + 1))
}

/// Balanced `{...}`, honouring `\{` and `\}` escapes.
/// Returns the inner text and the bytes consumed, or `None` when unbalanced.
pub(crate) fn brace_group(s: &str) -> Option<(&str, usize)> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..i], i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Expand `$1`..`$9` in `template` from `captures`. Missing groups expand to nothing.
pub(crate) fn expand_template(template: &str, captures: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + captures.iter().map(String::len).sum::<usize>());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                chars.next();
                if let Some(group) = (digit as usize).checked_sub(1).and_then(|i| captures.get(i)) {
                    out.push_str(group);
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brace_group_balances_nesting() {
        assert_eq!(brace_group("{\\sqrt{x}}{y}"), Some(("\\sqrt{x}", 10)));
        assert_eq!(brace_group("{a{b}c}"), Some(("a{b}c", 7)));
    }

    #[test]
    fn brace_group_rejects_unbalanced() {
        assert_eq!(brace_group("{a{b}"), None);
        assert_eq!(brace_group("a}"), None);
    }

    #[test]
    fn brace_group_skips_escaped_braces() {
        assert_eq!(brace_group("{\\{a\\}}"), Some(("\\{a\\}", 7)));
    }

    #[test]
    fn command_requires_word_end() {
        let pattern = Pattern::Command("in");
        assert!(pattern.match_at(None, "\\in A").is_some());
        assert!(pattern.match_at(None, "\\in").is_some());
        assert!(pattern.match_at(None, "\\infty").is_none());
        assert!(pattern.match_at(None, "\\int").is_none());
    }

    #[test]
    fn word_requires_boundary_before() {
        let pattern = Pattern::Word("eq.");
        assert!(pattern.match_at(Some(' '), "eq. 3").is_some());
        assert!(pattern.match_at(None, "eq. 3").is_some());
        assert!(pattern.match_at(Some('r'), "eq. 3").is_none());
    }

    #[test]
    fn macro_captures_arguments() {
        let pattern = Pattern::Macro {
            command: "frac",
            index: Index::Absent,
            args: 2,
        };
        let m = pattern.match_at(None, "\\frac{1}{2} + x").unwrap();
        assert_eq!(m.consumed, "\\frac{1}{2}".len());
        assert_eq!(m.captures, vec!["1", "2"]);
    }

    #[test]
    fn macro_index_variants() {
        let plain = Pattern::Macro {
            command: "sqrt",
            index: Index::Absent,
            args: 1,
        };
        let cube = Pattern::Macro {
            command: "sqrt",
            index: Index::Exact("3"),
            args: 1,
        };
        let any = Pattern::Macro {
            command: "sqrt",
            index: Index::Any,
            args: 1,
        };
        assert!(plain.match_at(None, "\\sqrt[3]{x}").is_none());
        assert_eq!(cube.match_at(None, "\\sqrt[3]{x}").unwrap().captures, vec!["x"]);
        assert!(cube.match_at(None, "\\sqrt[4]{x}").is_none());
        assert_eq!(any.match_at(None, "\\sqrt[n]{x}").unwrap().captures, vec!["n", "x"]);
        assert!(any.match_at(None, "\\sqrt{x}").is_none());
    }

    #[test]
    fn macro_without_braces_does_not_match() {
        let pattern = Pattern::Macro {
            command: "hat",
            index: Index::Absent,
            args: 1,
        };
        assert!(pattern.match_at(None, "\\hat x").is_none());
        assert!(pattern.match_at(None, "\\hat{x").is_none());
    }

    #[test]
    fn template_expansion() {
        let caps = vec!["a".to_string(), "b".to_string()];
        assert_eq!(expand_template("$1 over $2", &caps), "a over b");
        assert_eq!(expand_template("$3 costs $", &caps), " costs $");
    }
}
