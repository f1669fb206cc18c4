//! The rule table: ordered, immutable `(pattern, template)` rules.
//!
//! `math_rules` run only inside inline-math spans, in four precedence
//! bands (structural macros, named symbols, exponent conventions, residual
//! noise). `text_rules` expand scholarly abbreviations over the whole
//! flattened text. `cleanup_rules` drop citations and URLs when narrating a
//! full paper.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::pattern::{expand_template, Index, Pattern};

/// Precedence band of a rule. Math rules are stored in non-decreasing band order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Macros with arguments and fixed multi-token phrases.
    Structural,
    /// Zero-argument symbols and operators.
    Symbol,
    /// `^2`, `^3`, transpose, degrees.
    Exponent,
    /// Leftover LaTeX syntax, removed last.
    Residual,
    /// Scholarly abbreviations in running text.
    Abbreviation,
}

/// One replacement rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub category: Category,
    pub pattern: Pattern,
    /// Output text; `$1`, `$2` refer to captured macro arguments.
    pub template: &'static str,
    /// Surround the output with single spaces so it never fuses with neighbours.
    pub padded: bool,
}

impl Rule {
    pub const fn spoken(category: Category, pattern: Pattern, template: &'static str) -> Self {
        Self {
            category,
            pattern,
            template,
            padded: true,
        }
    }

    pub const fn plain(category: Category, pattern: Pattern, template: &'static str) -> Self {
        Self {
            category,
            pattern,
            template,
            padded: false,
        }
    }

    /// Apply this rule to every non-overlapping match, left to right.
    pub fn apply(&self, input: &str) -> String {
        let Some(needle) = self.pattern.needle() else {
            return collapse_whitespace(input, self.template);
        };

        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(pos) = rest.find(needle.as_str()) {
            out.push_str(&rest[..pos]);
            let candidate = &rest[pos..];
            match self.pattern.match_at(out.chars().next_back(), candidate) {
                Some(found) => {
                    // Same macro nested in its own argument, e.g. `\frac{\frac{a}{b}}{c}`.
                    let captures: Vec<String> = found
                        .captures
                        .iter()
                        .map(|capture| match self.pattern {
                            Pattern::Macro { .. } => self.apply(capture),
                            _ => (*capture).to_string(),
                        })
                        .collect();
                    let replacement = expand_template(self.template, &captures);
                    if self.padded {
                        out.push(' ');
                        out.push_str(&replacement);
                        out.push(' ');
                    } else {
                        out.push_str(&replacement);
                    }
                    rest = &candidate[found.consumed..];
                }
                None => {
                    out.push_str(&needle);
                    rest = &candidate[needle.len()..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn collapse_whitespace(input: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push_str(replacement);
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Regex rewrite used for citation and URL removal.
#[derive(Debug, Clone)]
pub struct CleanupRule {
    pub regex: Regex,
    pub replacement: &'static str,
}

impl CleanupRule {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            regex: Regex::new(pattern).expect("cleanup rule pattern must compile"),
            replacement,
        }
    }

    pub fn apply(&self, input: &str) -> String {
        self.regex.replace_all(input, self.replacement).into_owned()
    }
}

/// Fixed phrases that must win over the generic macros below them.
const PHRASES: &[(&str, &str)] = &[
    (r"\lVert\cdot\rVert", "norm"),
    (r"\mathbb{E}", "expectation"),
    (r"\operatorname{supp}", "support of"),
];

/// `(command, index, argument count, template)`.
const MACROS: &[(&str, Index, usize, &str)] = &[
    ("frac", Index::Absent, 2, "$1 over $2"),
    ("dfrac", Index::Absent, 2, "$1 over $2"),
    ("tfrac", Index::Absent, 2, "$1 over $2"),
    ("sqrt", Index::Absent, 1, "square root of $1"),
    ("sqrt", Index::Exact("2"), 1, "square root of $1"),
    ("sqrt", Index::Exact("3"), 1, "cube root of $1"),
    ("sqrt", Index::Any, 1, "$1-th root of $2"),
    ("hat", Index::Absent, 1, "$1 hat"),
    ("widehat", Index::Absent, 1, "$1 hat"),
    ("bar", Index::Absent, 1, "$1 bar"),
    ("overline", Index::Absent, 1, "$1 bar"),
    ("tilde", Index::Absent, 1, "$1 tilde"),
    ("widetilde", Index::Absent, 1, "$1 tilde"),
    ("dot", Index::Absent, 1, "$1 dot"),
    ("ddot", Index::Absent, 1, "$1 double dot"),
    ("vec", Index::Absent, 1, "vector $1"),
    ("mathbb", Index::Absent, 1, "$1"),
    ("mathds", Index::Absent, 1, "$1"),
    ("mathbbm", Index::Absent, 1, "$1"),
    ("mathcal", Index::Absent, 1, "$1"),
    ("mathbf", Index::Absent, 1, "$1"),
    ("mathrm", Index::Absent, 1, "$1"),
    ("mathit", Index::Absent, 1, "$1"),
    ("mathsf", Index::Absent, 1, "$1"),
    ("boldsymbol", Index::Absent, 1, "$1"),
    ("bm", Index::Absent, 1, "$1"),
    ("text", Index::Absent, 1, "$1"),
    ("textrm", Index::Absent, 1, "$1"),
    ("textbf", Index::Absent, 1, "$1"),
    ("operatorname", Index::Absent, 1, "$1"),
];

/// Zero-argument control words and their spoken form.
const SYMBOLS: &[(&str, &str)] = &[
    // calculus
    ("int", "integral"),
    ("iint", "double integral"),
    ("oint", "contour integral"),
    ("sum", "summation over"),
    ("prod", "product over"),
    ("lim", "limit"),
    ("infty", "infinity"),
    ("partial", "partial"),
    ("nabla", "nabla"),
    // operators and relations
    ("pm", "plus or minus"),
    ("mp", "minus or plus"),
    ("times", "times"),
    ("div", "divided by"),
    ("cdot", "times"),
    ("leq", "less than or equal to"),
    ("le", "less than or equal to"),
    ("geq", "greater than or equal to"),
    ("ge", "greater than or equal to"),
    ("neq", "not equal to"),
    ("ne", "not equal to"),
    ("approx", "approximately"),
    ("simeq", "approximately equal to"),
    ("sim", "distributed as"),
    ("equiv", "equivalent to"),
    ("propto", "proportional to"),
    ("ll", "much less than"),
    ("gg", "much greater than"),
    // quantifiers and logic
    ("forall", "for all"),
    ("exists", "there exists"),
    ("rightarrow", "goes to"),
    ("to", "goes to"),
    ("Rightarrow", "implies"),
    ("implies", "implies"),
    ("Leftrightarrow", "if and only if"),
    ("iff", "if and only if"),
    ("mapsto", "maps to"),
    ("land", "and"),
    ("wedge", "and"),
    ("lor", "or"),
    ("vee", "or"),
    ("neg", "not"),
    ("lnot", "not"),
    // sets
    ("in", "in"),
    ("notin", "is not an element of"),
    ("emptyset", "empty set"),
    ("varnothing", "empty set"),
    ("subseteq", "is a subset of or equal to"),
    ("subset", "subset"),
    ("supseteq", "is a superset of or equal to"),
    ("supset", "superset"),
    ("cup", "union"),
    ("cap", "intersection"),
    ("setminus", "set minus"),
    // greek
    ("alpha", "alpha"),
    ("beta", "beta"),
    ("gamma", "gamma"),
    ("Gamma", "capital gamma"),
    ("delta", "delta"),
    ("Delta", "capital delta"),
    ("epsilon", "epsilon"),
    ("varepsilon", "epsilon"),
    ("zeta", "zeta"),
    ("eta", "eta"),
    ("theta", "theta"),
    ("vartheta", "theta"),
    ("Theta", "capital theta"),
    ("iota", "iota"),
    ("kappa", "kappa"),
    ("lambda", "lambda"),
    ("Lambda", "capital lambda"),
    ("mu", "mu"),
    ("nu", "nu"),
    ("xi", "ksi"),
    ("Xi", "capital ksi"),
    ("pi", "pi"),
    ("Pi", "capital pi"),
    ("rho", "rho"),
    ("sigma", "sigma"),
    ("Sigma", "capital sigma"),
    ("tau", "tau"),
    ("upsilon", "upsilon"),
    ("phi", "phi"),
    ("varphi", "phi"),
    ("Phi", "capital phi"),
    ("chi", "chi"),
    ("psi", "psi"),
    ("Psi", "capital psi"),
    ("omega", "omega"),
    ("Omega", "capital omega"),
    // functions
    ("sin", "sine"),
    ("cos", "cosine"),
    ("tan", "tangent"),
    ("cot", "cotangent"),
    ("arcsin", "arcsine"),
    ("arccos", "arccosine"),
    ("arctan", "arctangent"),
    ("sinh", "hyperbolic sine"),
    ("cosh", "hyperbolic cosine"),
    ("tanh", "hyperbolic tangent"),
    ("log", "log"),
    ("ln", "natural log"),
    ("exp", "exponential"),
    ("max", "max"),
    ("min", "min"),
    ("sup", "supremum"),
    ("inf", "infimum"),
    ("det", "determinant"),
    ("Pr", "probability"),
    // delimiters that carry no sound
    ("lVert", "norm of"),
    ("rVert", ""),
    ("langle", ""),
    ("rangle", ""),
    ("dots", ""),
    ("ldots", ""),
    ("cdots", ""),
    ("vdots", ""),
    ("mid", ""),
];

/// Single-character operators, after the control words so `\leq` is never split.
const OPERATORS: &[(&str, &str)] = &[
    ("+", "plus"),
    ("-", "minus"),
    ("*", "times"),
    ("/", "divided by"),
    ("=", "equals"),
    ("<", "less than"),
    (">", "greater than"),
    ("'", "prime"),
];

const EXPONENTS: &[(&str, &str)] = &[
    (r"^{\circ}", "degrees"),
    (r"^\circ", "degrees"),
    ("^{T}", "transpose"),
    (r"^{\top}", "transpose"),
    (r"^\top", "transpose"),
    ("^{2}", "squared"),
    ("^2", "squared"),
    ("^{3}", "cubed"),
    ("^3", "cubed"),
];

const SPACING: &[&str] = &[r"\,", r"\;", r"\:", r"\!", r"\ "];

const NOISE_COMMANDS: &[&str] = &[
    "quad", "qquad", "left", "right", "big", "Big", "bigg", "Bigg", "bigl", "bigr", "Bigl", "Bigr",
    "boldsymbol", "displaystyle", "limits", "nolimits",
];

/// Order matters: `|` before `\` so `\|` leaves nothing behind.
const NOISE_CHARS: &[&str] = &["^", "|", "\\", "{", "}", "_", "&", "~"];

/// Abbreviation → expansion, matched case-sensitively at a word start.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("w.r.t.", "with respect to"),
    ("w.r.t", "with respect to"),
    ("w.l.o.g.", "without loss of generality"),
    ("a.e.", "almost everywhere"),
    ("a.s.", "almost surely"),
    ("s.t.", "such that"),
    ("i.i.d.", "independent and identically distributed"),
    ("i.e.", "that is"),
    ("e.g.", "for example"),
    ("e. g.", "for example"),
    ("cf.", "compare"),
    ("resp.", "respectively"),
    ("approx.", "approximately"),
    ("vs.", "versus"),
    ("et al.", "et al"),
    ("Eqs.", "Equations"),
    ("Eq.", "Equation"),
    ("eq.", "equation"),
    ("Figs.", "Figures"),
    ("Fig.", "Figure"),
    ("fig.", "figure"),
    ("Sec.", "Section"),
    ("sec.", "section"),
    ("Tab.", "Table"),
    ("tab.", "table"),
    ("Thm.", "Theorem"),
    ("thm.", "theorem"),
    ("Def.", "Definition"),
    ("def.", "definition"),
    ("Prop.", "Proposition"),
    ("Lem.", "Lemma"),
    ("Cor.", "Corollary"),
    ("Alg.", "Algorithm"),
    ("Ex.", "Example"),
    ("ex.", "example"),
];

/// Citation and URL patterns dropped when narrating whole papers.
const CLEANUP: &[(&str, &str)] = &[
    // "Name et al. (2018)" → "Name et al."
    (r"(\b\w+\s+et al\.) (?:\[\d{4}\]|\(\d{4}\))\.?", "$1"),
    // numeric citations: [3], [1, 2], [4-7], [3, pp. 12-14]
    (r"\s*\[[0-9,\- ]+(?:, pp?\. ?[0-9,\-]+f{0,2}\.?)?\]", ""),
    // author-year citations: [Smith, 2018], (Garnelo et al., 2018; Kim, 2019a)
    (r"\s*\[[^\]]*, \d{4}(?:, [^\]]*, \d{4})*\]", ""),
    (r"\s*\([^)]*, \d{4}[a-zA-Z]?(?:[;,] [^)]*, \d{4}[a-zA-Z]?)*\)", ""),
    (r"\s*https?://[\w/:%#$&?()~.=+\-]*[\w\-]", ""),
    (r"\((\w+)\)-th", "$1-th"),
    // footnote marker glued to the last sentence: "of training.4"
    (r"([A-Za-z]+)\.(\d+)$", "$1."),
];

static GLOBAL: LazyLock<RuleTable> = LazyLock::new(RuleTable::standard);

/// The three ordered rule sets. Built once and shared read-only.
#[derive(Debug, Clone)]
pub struct RuleTable {
    math: Vec<Rule>,
    text: Vec<Rule>,
    cleanup: Vec<CleanupRule>,
}

impl RuleTable {
    /// Process-wide table, built on first use.
    pub fn global() -> &'static RuleTable {
        &GLOBAL
    }

    /// Build the standard table from the static rule data.
    pub fn standard() -> Self {
        let mut math = Vec::with_capacity(256);

        math.extend(
            PHRASES
                .iter()
                .map(|(text, word)| Rule::spoken(Category::Structural, Pattern::Literal(text), word)),
        );
        math.extend(MACROS.iter().map(|(command, index, args, template)| {
            Rule::spoken(
                Category::Structural,
                Pattern::Macro {
                    command,
                    index: *index,
                    args: *args,
                },
                template,
            )
        }));
        math.extend(
            SYMBOLS
                .iter()
                .map(|(name, word)| Rule::spoken(Category::Symbol, Pattern::Command(name), word)),
        );
        math.extend(
            OPERATORS
                .iter()
                .map(|(op, word)| Rule::spoken(Category::Symbol, Pattern::Literal(op), word)),
        );
        math.extend(
            EXPONENTS
                .iter()
                .map(|(text, word)| Rule::spoken(Category::Exponent, Pattern::Literal(text), word)),
        );
        math.extend(
            SPACING
                .iter()
                .map(|text| Rule::spoken(Category::Residual, Pattern::Literal(text), "")),
        );
        math.extend(
            NOISE_COMMANDS
                .iter()
                .map(|name| Rule::spoken(Category::Residual, Pattern::Command(name), "")),
        );
        math.extend(
            NOISE_CHARS
                .iter()
                .map(|text| Rule::spoken(Category::Residual, Pattern::Literal(text), "")),
        );
        math.push(Rule::plain(Category::Residual, Pattern::SpaceRun, " "));

        let text = ABBREVIATIONS
            .iter()
            .map(|(abbr, expansion)| Rule::plain(Category::Abbreviation, Pattern::Word(abbr), expansion))
            .collect();

        let cleanup = CLEANUP
            .iter()
            .map(|(pattern, replacement)| CleanupRule::new(pattern, replacement))
            .collect();

        Self { math, text, cleanup }
    }

    pub fn math_rules(&self) -> &[Rule] {
        &self.math
    }

    pub fn text_rules(&self) -> &[Rule] {
        &self.text
    }

    pub fn cleanup_rules(&self) -> &[CleanupRule] {
        &self.cleanup
    }

    /// Fold every math rule over `latex`, in order, and trim the result.
    pub fn speak_math(&self, latex: &str) -> String {
        let spoken = self
            .math
            .iter()
            .fold(latex.to_string(), |acc, rule| rule.apply(&acc));
        spoken.trim().to_string()
    }

    /// Expand abbreviations, each rule once across the whole string.
    pub fn apply_text(&self, text: &str) -> String {
        self.text.iter().fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }

    /// Drop citations and URLs.
    pub fn apply_cleanup(&self, text: &str) -> String {
        self.cleanup
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speak(latex: &str) -> String {
        RuleTable::global().speak_math(latex)
    }

    #[test]
    fn fraction() {
        assert_eq!(speak(r"\frac{1}{2}"), "1 over 2");
    }

    #[test]
    fn roots() {
        assert_eq!(speak(r"\sqrt{x}"), "square root of x");
        assert_eq!(speak(r"\sqrt[3]{x}"), "cube root of x");
        assert_eq!(speak(r"\sqrt[n]{x}"), "n-th root of x");
        assert_eq!(speak(r"\sqrt[4]{y}"), "4-th root of y");
        assert_eq!(speak(r"\sqrt[1]{y}"), "1-th root of y");
    }

    #[test]
    fn greek_and_operators() {
        assert_eq!(speak(r"\alpha + \beta"), "alpha plus beta");
        assert_eq!(speak(r"a \leq b"), "a less than or equal to b");
        assert_eq!(speak(r"x \in \mathbb{R}"), "x in R");
    }

    #[test]
    fn squared_before_caret_stripping() {
        assert_eq!(speak("x^2"), "x squared");
        assert_eq!(speak("y^{3}"), "y cubed");
        assert_eq!(speak("A^{T}"), "A transpose");
        assert_eq!(speak(r"90^{\circ}"), "90 degrees");
    }

    #[test]
    fn decorators_and_fonts() {
        assert_eq!(speak(r"\hat{y}"), "y hat");
        assert_eq!(speak(r"\bar{x}"), "x bar");
        assert_eq!(speak(r"\tilde{x}"), "x tilde");
        assert_eq!(speak(r"\dot{q}"), "q dot");
        assert_eq!(speak(r"\ddot{q}"), "q double dot");
        assert_eq!(speak(r"\mathcal{L}"), "L");
        assert_eq!(speak(r"\mathbf{v}"), "v");
        assert_eq!(speak(r"\mathds{1}"), "1");
    }

    #[test]
    fn expectation_wins_over_blackboard_bold() {
        assert_eq!(speak(r"\mathbb{E}[X]"), "expectation [X]");
    }

    #[test]
    fn nested_macros_use_balanced_braces() {
        assert_eq!(speak(r"\frac{\sqrt{x}}{y}"), "square root of x over y");
        assert_eq!(speak(r"\frac{\frac{a}{b}}{c}"), "a over b over c");
        assert_eq!(speak(r"\sqrt{\frac{1}{n}}"), "square root of 1 over n");
    }

    #[test]
    fn unbalanced_macro_is_cleaned_not_rejected() {
        assert_eq!(speak(r"\frac{1}{2"), "frac 1 2");
    }

    #[test]
    fn command_prefixes_do_not_collide() {
        assert_eq!(speak(r"\int_0^\infty"), "integral 0 infinity");
        assert_eq!(speak(r"\left( x \right)"), "( x )");
        assert_eq!(speak(r"a \cdots b"), "a b");
    }

    #[test]
    fn residual_noise_removed() {
        let spoken = speak(r"\left\| x_{i} \right\|_2");
        assert!(!spoken.contains(['\\', '{', '}', '_', '|', '^']));
        assert_eq!(spoken, "x i 2");
    }

    #[test]
    fn sum_with_subscripts_and_transpose() {
        assert_eq!(
            speak(r"z(x)=\sum_{l}r(x)_{l}z_{l}^{T}"),
            "z(x) equals summation over l r(x) l z l transpose"
        );
    }

    #[test]
    fn math_rules_are_in_band_order() {
        let rules = RuleTable::global().math_rules();
        assert!(rules.windows(2).all(|w| w[0].category <= w[1].category));
        assert!(rules.len() > 60);
    }

    #[test]
    fn speak_math_is_idempotent() {
        let table = RuleTable::global();
        for latex in [r"\frac{a}{b}", r"x^2 + \gamma", r"\hat{\theta}_{MLE}", r"f'(x) \neq 0"] {
            let once = table.speak_math(latex);
            assert_eq!(table.speak_math(&once), once, "not idempotent for {latex}");
        }
    }

    #[test]
    fn abbreviations() {
        let table = RuleTable::global();
        assert_eq!(table.apply_text("w.r.t. the mean"), "with respect to the mean");
        assert_eq!(table.apply_text("see Fig. 2, i.e. the plot"), "see Figure 2, that is the plot");
        assert_eq!(table.apply_text("e.g. this"), "for example this");
    }

    #[test]
    fn abbreviations_are_case_sensitive_and_word_anchored() {
        let table = RuleTable::global();
        assert_eq!(table.apply_text("E.G. stays"), "E.G. stays");
        assert_eq!(table.apply_text("the freq. band"), "the freq. band");
        assert_eq!(table.apply_text("a complex. Next"), "a complex. Next");
    }

    #[test]
    fn cleanup_drops_citations_and_urls() {
        let table = RuleTable::global();
        assert_eq!(
            table.apply_cleanup("We use NPs (Garnelo et al., 2018), like Eslami et al. (2018)."),
            "We use NPs, like Eslami et al."
        );
        assert_eq!(table.apply_cleanup("see Equation (3) below"), "see Equation (3) below");
        assert_eq!(table.apply_cleanup("as shown [3, 4]."), "as shown.");
        assert_eq!(
            table.apply_cleanup("Code at https://github.com/a/b."),
            "Code at."
        );
        assert_eq!(table.apply_cleanup("the (k)-th step"), "the k-th step");
    }
}
