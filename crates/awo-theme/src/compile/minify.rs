//! Stylesheet minification.

use std::sync::OnceLock;

use regex::Regex;

struct Patterns {
    comments: Regex,
    whitespace: Regex,
    punctuation: Regex,
    after_colon: Regex,
    trailing_semicolons: Regex,
}

impl Patterns {
    fn compile() -> Option<Self> {
        Some(Self {
            comments: Regex::new(r"(?s)/\*.*?\*/").ok()?,
            whitespace: Regex::new(r"\s+").ok()?,
            punctuation: Regex::new(r"\s*([{};])\s*").ok()?,
            after_colon: Regex::new(r":\s+").ok()?,
            trailing_semicolons: Regex::new(r";+\}").ok()?,
        })
    }

    fn get() -> Option<&'static Self> {
        static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile).as_ref()
    }

    fn pass(&self, css: &str) -> String {
        let css = self.comments.replace_all(css, "");
        let css = self.whitespace.replace_all(&css, " ");
        let css = self.punctuation.replace_all(&css, "$1");
        let css = self.after_colon.replace_all(&css, ":");
        let css = self.trailing_semicolons.replace_all(&css, "}");
        css.trim().to_string()
    }
}

/// Strip comments and redundant whitespace, and drop the last semicolon
/// of each block.
///
/// `minify(minify(x)) == minify(x)` for every input: passes repeat until the
/// text stops changing. No pass lengthens the text, so this terminates.
pub fn minify(css: &str) -> String {
    let Some(patterns) = Patterns::get() else {
        return css.trim().to_string();
    };

    let mut current = patterns.pass(css);
    loop {
        let next = patterns.pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minifies_blocks() {
        let css = ":root {\n  --awo-primitives-color-primary: #FF0000;\n  --awo-spacing: 1rem;\n}\n";
        assert_eq!(
            minify(css),
            ":root{--awo-primitives-color-primary:#FF0000;--awo-spacing:1rem}"
        );
    }

    #[test]
    fn removes_comments() {
        assert_eq!(minify("/* header */\n.a { color: red; } /* tail */"), ".a{color:red}");
    }

    #[test]
    fn keeps_descendant_pseudo_selectors() {
        assert_eq!(minify("a :hover { color: red; }"), "a :hover{color:red}");
    }

    #[test]
    fn idempotent() {
        for css in [
            ":root {\n  --a: 1px;\n}\n@media (prefers-color-scheme: dark) {\n  :root {\n    --a: 2px;\n  }\n}\n",
            ".x { a: b;; }",
            "//**/* hidden */ .y { c: d; }",
            "   ",
            "",
            ".a{b:c}",
        ] {
            let once = minify(css);
            assert_eq!(minify(&once), once, "input {css:?}");
        }
    }

    #[test]
    fn nested_comment_opener_is_removed() {
        // Removing the inner comment exposes a new one.
        assert_eq!(minify("//**/* hidden */.y{c:d}"), ".y{c:d}");
    }
}
