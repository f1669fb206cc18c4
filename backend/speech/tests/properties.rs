//! Whole-pipeline properties of the normalizer.

use papervoice_core::MAX_INPUT_CHARS;
use papervoice_speech::{NormalizeOptions, Normalizer, RuleTable};

const SAMPLES: &[&str] = &[
    "The loss $\\mathcal{L}(\\theta) = \\frac{1}{n}\\sum_{i} \\ell_i$ is minimized w.r.t. $\\theta$.",
    "# Method\n\nWe set $\\alpha \\leq \\beta$, i.e. the step is small.\n\n$$\\nabla f(x) = 0$$\n\nThus $x^2 \\geq 0$.",
    "- $\\hat{y}$ is the estimate\n- $\\bar{x}$ is the mean, e.g. of $\\mathbb{R}^n$ samples",
    "Plain text with no math at all.",
    "Nested $\\frac{\\sqrt{a}}{\\sqrt[3]{b}}$ and $A^{T} A$ and $90^{\\circ}$.",
    "Inline \\(x \\in X\\) and displayed \\[\\int f\\] delimiters.",
    "a \\*starred\\* word",
    "&lt;b&gt;bold&lt;/b&gt; x",
    "$2$. The next step",
    "\\# Not a heading and \\- not a list, R&amp;D &amp;amp; [a\\](b)",
    "snake_case and `code` with ~tilde~",
    "",
];

#[test]
fn normalize_is_idempotent() {
    let normalizer = Normalizer::default();
    for sample in SAMPLES {
        let once = normalizer.normalize(sample);
        let twice = normalizer.normalize(once.as_str());
        assert_eq!(once, twice, "not idempotent for {sample:?}");
    }
}

#[test]
fn truncated_output_is_idempotent() {
    let normalizer = Normalizer::default();
    for long in ["abc ".repeat(3000), "ab ".repeat(3000), "abcd".repeat(2000)] {
        let once = normalizer.normalize(&long);
        let twice = normalizer.normalize(once.as_str());
        assert_eq!(once, twice);
        assert!(once.as_str().ends_with('\n'));
        assert!(!once.as_str().ends_with(" \n"));
    }
}

#[test]
fn normalize_is_deterministic() {
    let a = Normalizer::default();
    let table = RuleTable::standard();
    let b = Normalizer::with_rules(&table, NormalizeOptions::default());
    for sample in SAMPLES {
        assert_eq!(a.normalize(sample), b.normalize(sample));
    }
}

#[test]
fn output_never_exceeds_budget() {
    let normalizer = Normalizer::default();
    let huge = "$\\alpha$ i.e. ".repeat(1500);
    assert!(normalizer.normalize(&huge).char_count() <= MAX_INPUT_CHARS);

    let wide = "数学 ".repeat(3000);
    let spoken = normalizer.normalize(&wide);
    assert!(spoken.char_count() <= MAX_INPUT_CHARS);
    assert!(spoken.as_str().ends_with("数学\n"));
}

#[test]
fn block_math_collapses_to_one_period() {
    let normalizer = Normalizer::default();
    for latex in ["x", "\\frac{a}{b}", "\\begin{aligned} a &= b \\\\ c &= d \\end{aligned}"] {
        let markdown = format!("$${latex}$$");
        assert_eq!(normalizer.normalize(&markdown).as_str(), ".\n", "for {latex}");
    }
}

#[test]
fn spoken_output_has_no_latex_left() {
    let normalizer = Normalizer::default();
    for sample in SAMPLES {
        let spoken = normalizer.normalize(sample);
        assert!(
            !spoken.as_str().contains(['\\', '$', '{', '}', '^', '_']),
            "latex residue in {spoken:?}"
        );
    }
}

#[test]
fn rule_coverage_examples() {
    let normalizer = Normalizer::default();
    let cases = [
        ("$\\frac{1}{2}$", "1 over 2\n"),
        ("$\\sqrt{x}$", "square root of x\n"),
        ("$\\alpha + \\beta$", "alpha plus beta\n"),
        ("$x^2$", "x squared\n"),
        ("w.r.t. the mean", "with respect to the mean\n"),
    ];
    for (input, expected) in cases {
        assert_eq!(normalizer.normalize(input).as_str(), expected, "for {input}");
    }
}
