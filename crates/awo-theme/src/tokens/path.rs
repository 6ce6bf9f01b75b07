//! Dotted token paths.

use std::fmt;

use crate::error::{Error, Result};

/// The three layers of a token tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    /// Raw design values.
    Primitives,
    /// Purpose-named aliases.
    Semantic,
    /// Per-component variant properties.
    Components,
}

impl Layer {
    /// Classify the first segment of a path. Singular forms are accepted.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "primitives" | "primitive" => Some(Layer::Primitives),
            "semantic" => Some(Layer::Semantic),
            "components" | "component" => Some(Layer::Components),
            _ => None,
        }
    }

    /// Canonical segment name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Primitives => "primitives",
            Layer::Semantic => "semantic",
            Layer::Components => "components",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A validated dotted path such as `semantic.colors.primary`.
///
/// Every segment is non-empty and restricted to `[A-Za-z0-9_-]`. Paths have
/// at least two segments. Whether the first segment names a known [`Layer`]
/// is checked at lookup time, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenPath {
    raw: String,
}

impl TokenPath {
    /// Parse and validate a path.
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim();
        if path.is_empty() {
            return Err(Error::validation("token path", "path is empty"));
        }

        let mut count = 0;
        for segment in path.split('.') {
            if !is_valid_segment(segment) {
                return Err(Error::validation(
                    "token path",
                    format!("'{path}' has invalid segment '{segment}'"),
                ));
            }
            count += 1;
        }

        if count < 2 {
            return Err(Error::validation(
                "token path",
                format!("'{path}' needs at least two segments"),
            ));
        }

        Ok(Self {
            raw: path.to_string(),
        })
    }

    /// The path text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Iterate over the segments.
    pub fn segments(&self) -> std::str::Split<'_, char> {
        self.raw.split('.')
    }

    /// The layer named by the first segment, if known.
    pub fn layer(&self) -> Option<Layer> {
        self.segments().next().and_then(Layer::from_segment)
    }

    /// The segments after the layer.
    pub fn tail(&self) -> Vec<&str> {
        self.segments().skip(1).collect()
    }

    /// The path with its layer spelled canonically, so `component.x.y` and
    /// `components.x.y` compare equal. Unknown layers are kept as written.
    pub fn canonical(&self) -> String {
        match (self.layer(), self.raw.split_once('.')) {
            (Some(layer), Some((_, rest))) => format!("{}.{rest}", layer.as_str()),
            _ => self.raw.clone(),
        }
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for TokenPath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl std::str::FromStr for TokenPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_spells_out_layer() {
        let canonical = |p: &str| TokenPath::parse(p).unwrap().canonical();
        assert_eq!(canonical("component.button.default.bg"), "components.button.default.bg");
        assert_eq!(canonical("primitive.colors.blue"), "primitives.colors.blue");
        assert_eq!(canonical("semantic.colors.primary"), "semantic.colors.primary");
        assert_eq!(canonical("custom.thing"), "custom.thing");
    }

    #[test]
    fn parse_valid_paths() {
        let path = TokenPath::parse("semantic.colors.primary").unwrap();
        assert_eq!(path.layer(), Some(Layer::Semantic));
        assert_eq!(path.tail(), vec!["colors", "primary"]);

        let path = TokenPath::parse(" primitives.colors.blue-500 ").unwrap();
        assert_eq!(path.as_str(), "primitives.colors.blue-500");

        let path = TokenPath::parse("component.button.primary.background").unwrap();
        assert_eq!(path.layer(), Some(Layer::Components));
    }

    #[test]
    fn unknown_layer_still_parses() {
        let path = TokenPath::parse("brand.logo").unwrap();
        assert_eq!(path.layer(), None);
    }

    #[test]
    fn reject_malformed_paths() {
        for bad in ["", "   ", "semantic", "semantic..primary", "semantic.colors.", "semantic.col ors", "a.b#c"] {
            let err = TokenPath::parse(bad).unwrap_err();
            assert!(matches!(err, Error::Validation { .. }), "{bad:?} -> {err}");
        }
    }
}
