//! Literal vs. reference classification of raw token values.
//!
//! A token value is a plain string. Whether it is a CSS literal or a dotted
//! reference to another token is decided here and nowhere else, so the
//! heuristic can be swapped without touching the resolver or compiler.

use std::sync::OnceLock;

use regex::Regex;

/// CSS function prefixes that always mark a literal.
const CSS_FUNCTION_PREFIXES: &[&str] = &[
    "calc(",
    "var(",
    "url(",
    "rgb(",
    "rgba(",
    "hsl(",
    "hsla(",
    "linear-gradient(",
    "radial-gradient(",
    "conic-gradient(",
    "repeating-linear-gradient(",
    "repeating-radial-gradient(",
];

const NAMED_COLORS: &[&str] = &[
    "transparent",
    "currentcolor",
    "black",
    "white",
    "red",
    "blue",
    "green",
    "yellow",
    "orange",
    "purple",
    "pink",
    "gray",
    "grey",
    "brown",
    "cyan",
    "magenta",
];

const CSS_KEYWORDS: &[&str] = &[
    "inherit", "initial", "unset", "revert", "revert-layer", "none", "auto", "normal",
    "solid", "dashed", "dotted", "double", "bold", "bolder", "lighter", "italic",
    "oblique", "uppercase", "lowercase", "capitalize", "underline", "overline",
    "line-through", "left", "right", "center", "justify", "block", "inline",
    "inline-block", "flex", "grid", "relative", "absolute", "fixed", "sticky",
    "hidden", "visible", "scroll",
];

/// Number with an optional unit: `0`, `-1.5`, `16px`, `100%`.
fn numeric_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?[a-zA-Z%]*$").ok())
        .as_ref()
}

/// Returns `true` if `value` is unmistakably a CSS literal.
///
/// Hex colors, CSS functions, numbers with an optional unit, named colors and
/// common keywords all qualify.
pub fn is_css_literal(value: &str) -> bool {
    let value = value.trim();
    if value.starts_with('#') {
        return true;
    }

    // Function prefixes match case-sensitively; only color and keyword
    // names fold case.
    if CSS_FUNCTION_PREFIXES.iter().any(|p| value.starts_with(p)) {
        return true;
    }

    if numeric_pattern().is_some_and(|re| re.is_match(value)) {
        return true;
    }

    let lower = value.to_ascii_lowercase();
    NAMED_COLORS.contains(&lower.as_str()) || CSS_KEYWORDS.contains(&lower.as_str())
}

/// Returns `true` if `value` should be followed as a reference to another
/// token rather than emitted as-is.
///
/// After trimming, a reference contains no space and is made of at least two
/// non-empty dot-separated segments that are not a CSS literal. Values such
/// as `1.5rem` or `0.5` contain dots but stay literals. Only the space
/// character disqualifies a value; inner tabs leave it a (malformed)
/// reference that path parsing later rejects.
pub fn is_reference(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.contains(' ') || !value.contains('.') {
        return false;
    }

    if is_css_literal(value) {
        return false;
    }

    value.split('.').all(|segment| !segment.is_empty())
}

/// A classified token value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValue<'a> {
    /// Emitted verbatim.
    Literal(&'a str),
    /// A dotted path to another token, trimmed.
    Reference(&'a str),
}

impl<'a> TokenValue<'a> {
    /// Classify a raw value.
    pub fn classify(raw: &'a str) -> Self {
        if is_reference(raw) {
            TokenValue::Reference(raw.trim())
        } else {
            TokenValue::Literal(raw)
        }
    }

    /// Returns `true` for references.
    pub fn is_reference(&self) -> bool {
        matches!(self, TokenValue::Reference(_))
    }
}
